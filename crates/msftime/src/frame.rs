//! One minute of MSF A/B code bits

use std::fmt;
use std::ops::Range;

/// Seconds in one MSF minute frame
///
/// Leap seconds (61-second minutes) are not supported.
pub const MINUTE_SECONDS: usize = 60;

/// Second-of-minute, always in `0..60`
///
/// The index can only be constructed or advanced modulo
/// [`MINUTE_SECONDS`], so a `SecondIndex` is always a valid
/// index into a [`FrameBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecondIndex(u8);

impl SecondIndex {
    /// Second zero, which follows the minute marker
    pub const ZERO: SecondIndex = SecondIndex(0);

    /// Index for second `sec`, wrapped into `0..60`
    pub fn new(sec: usize) -> Self {
        Self((sec % MINUTE_SECONDS) as u8)
    }

    /// Advance by one second, wrapping 59 → 0
    pub fn advance(&mut self) {
        *self = Self::new(self.0 as usize + 1);
    }

    /// Index as a `usize`
    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

impl From<SecondIndex> for usize {
    fn from(idx: SecondIndex) -> Self {
        idx.get()
    }
}

impl fmt::Display for SecondIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// The A-code and B-code bit transmitted in one second
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitPair {
    /// A-code bit
    pub a: bool,

    /// B-code bit
    pub b: bool,
}

impl BitPair {
    /// Both bits clear. Also used for the minute marker.
    pub const ZERO: BitPair = BitPair::new(false, false);

    /// Create from A and B bits
    pub const fn new(a: bool, b: bool) -> Self {
        Self { a, b }
    }
}

impl fmt::Display for BitPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.a as u8, self.b as u8)
    }
}

/// A-code and B-code bits for every second of one minute
///
/// The buffer is allocated once and overwritten in place as
/// each new minute arrives. No history is kept: the data for
/// second `n` of the current minute replaces second `n` of
/// the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    slots: [BitPair; MINUTE_SECONDS],
}

impl FrameBuffer {
    /// New buffer with every bit clear
    pub fn new() -> Self {
        Self {
            slots: [BitPair::ZERO; MINUTE_SECONDS],
        }
    }

    /// Build a buffer from separate A-code and B-code bits
    pub fn from_bits(a: &[bool; MINUTE_SECONDS], b: &[bool; MINUTE_SECONDS]) -> Self {
        let mut out = Self::new();
        for (slot, (&a, &b)) in out.slots.iter_mut().zip(a.iter().zip(b.iter())) {
            *slot = BitPair::new(a, b);
        }
        out
    }

    /// Clear every slot
    pub fn reset(&mut self) {
        self.slots = [BitPair::ZERO; MINUTE_SECONDS];
    }

    /// Bits for the given second
    pub fn get(&self, sec: SecondIndex) -> BitPair {
        self.slots[sec.get()]
    }

    /// Overwrite the bits for the given second
    pub fn set(&mut self, sec: SecondIndex, bits: BitPair) {
        self.slots[sec.get()] = bits;
    }

    /// A-code bit at second `idx`, as `0` or `1`
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not less than [`MINUTE_SECONDS`]. The
    /// decoder only reads from fixed layout positions.
    pub fn a(&self, idx: usize) -> u8 {
        self.slots[idx].a as u8
    }

    /// B-code bit at second `idx`, as `0` or `1`
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not less than [`MINUTE_SECONDS`].
    pub fn b(&self, idx: usize) -> u8 {
        self.slots[idx].b as u8
    }

    /// Iterate over the A-code bits in `range`
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past [`MINUTE_SECONDS`].
    pub fn a_bits(&self, range: Range<usize>) -> impl Iterator<Item = u8> + '_ {
        self.slots[range].iter().map(|bits| bits.a as u8)
    }

    /// All slots, in second order
    pub fn as_slice(&self) -> &[BitPair] {
        &self.slots
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FrameBuffer {
    /// Two rows of ones and zeros: A-codes, then B-codes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bits in &self.slots {
            write!(f, "{}", bits.a as u8)?;
        }
        writeln!(f)?;
        for bits in &self.slots {
            write!(f, "{}", bits.b as u8)?;
        }
        Ok(())
    }
}
