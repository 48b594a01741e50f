//! Minute frame decoding
//!
//! Once a full minute of A and B code bits has been
//! collected, the [`decode_frame()`] function validates and
//! converts it into a [`CalendarRecord`]. The A-code bits
//! carry the date and time. The B-code bits carry one odd
//! parity bit per field and the summer time flag.
//!
//! ```txt
//! A bits   field          B parity
//! ------   ------------   --------
//! 17..25   year           54
//! 25..36   month, day     55
//! 36..39   day of week    56
//! 39..52   hour, minute   57
//! 52..60   01111110 signature
//! ```
//!
//! Every check is run, even when an earlier one fails, so
//! that a failed minute can be diagnosed.

use std::fmt;
use std::ops::Range;

use arrayvec::ArrayVec;
use strum::IntoEnumIterator;
use thiserror::Error;

#[cfg(not(test))]
use log::warn;

#[cfg(test)]
use std::println as warn;

use crate::calendar::CalendarRecord;
use crate::frame::FrameBuffer;

/// Fixed A-code bits at the end of every minute
pub const SIGNATURE: [u8; 8] = [0, 1, 1, 1, 1, 1, 1, 0];

/// A-code position of the [`SIGNATURE`]
pub const SIGNATURE_START: usize = 52;

/// B-code position of the summer time flag
pub const DST_IDX: usize = 58;

// place values, right-aligned to the field width
const BCD_WEIGHTS: [u8; 8] = [80, 40, 20, 10, 8, 4, 2, 1];

/// A parity-protected group of A-code bits
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumIter,
    strum_macros::Display,
    strum_macros::IntoStaticStr,
)]
pub enum Field {
    /// Two-digit year
    #[strum(serialize = "year")]
    Year,

    /// Month and day of month
    #[strum(serialize = "month/day")]
    MonthDay,

    /// Day of week
    #[strum(serialize = "day of week")]
    Weekday,

    /// Hour and minute
    #[strum(serialize = "hour/minute")]
    HourMinute,
}

impl Field {
    /// A-code bits covered by this field
    pub fn range(&self) -> Range<usize> {
        match self {
            Field::Year => 17..25,
            Field::MonthDay => 25..36,
            Field::Weekday => 36..39,
            Field::HourMinute => 39..52,
        }
    }

    /// B-code bit holding this field's parity
    pub fn parity_idx(&self) -> usize {
        match self {
            Field::Year => 54,
            Field::MonthDay => 55,
            Field::Weekday => 56,
            Field::HourMinute => 57,
        }
    }

    // position in the validation table
    fn ordinal(&self) -> usize {
        *self as usize
    }
}

/// Outcome of one field's parity check
///
/// The decoded values of a `Valid` field are stored in the
/// [`FrameDecode::record()`], under the matching
/// [`CalendarRecord`] members. A field which failed parity
/// leaves its members at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldValidation {
    /// Parity passed; the field was decoded
    Valid,

    /// Parity failed; the field was not decoded
    ParityFailed,
}

impl FieldValidation {
    /// True if the field passed
    pub fn is_valid(&self) -> bool {
        *self == FieldValidation::Valid
    }
}

/// A failed check in one minute frame
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameDecodeErr {
    /// The A-code bits at 52..60 were not `01111110`
    #[error("minute signature mismatch")]
    SignatureMismatch,

    /// The odd parity check failed for a field
    #[error("{0} parity failed")]
    FieldParityFailed(Field),
}

/// Every failed check for one minute frame
pub type FrameDecodeErrs = ArrayVec<FrameDecodeErr, 5>;

/// A minute which could not be trusted
///
/// Carries every check which failed, along with whatever
/// fields did pass. The partial fields are for diagnostics
/// only and must not be mixed with a previous good minute.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
#[error("minute not decoded: {}", ErrList(.errors))]
pub struct MinuteDecodeErr {
    /// Failed checks, in decode order
    pub errors: FrameDecodeErrs,

    /// Fields which passed parity; the rest are zero
    pub partial: CalendarRecord,
}

/// Result of decoding one minute
pub type MinuteResult = Result<CalendarRecord, MinuteDecodeErr>;

/// Decoded minute frame, with per-field validation
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameDecode {
    record: CalendarRecord,
    signature_ok: bool,
    validation: [FieldValidation; 4],
    errors: FrameDecodeErrs,
}

impl FrameDecode {
    /// True if the signature and all four parity checks passed
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if the minute signature was present
    pub fn signature_ok(&self) -> bool {
        self.signature_ok
    }

    /// Parity outcome for `field`
    pub fn validation(&self, field: Field) -> FieldValidation {
        self.validation[field.ordinal()]
    }

    /// Decoded fields
    ///
    /// Fields which failed parity are zero. Do not trust
    /// this record unless [`is_ok()`](FrameDecode::is_ok).
    pub fn record(&self) -> &CalendarRecord {
        &self.record
    }

    /// Failed checks, in decode order
    pub fn errors(&self) -> &[FrameDecodeErr] {
        &self.errors
    }

    /// The complete record, or every reason it is unusable
    pub fn into_result(self) -> MinuteResult {
        if self.is_ok() {
            Ok(self.record)
        } else {
            Err(MinuteDecodeErr {
                errors: self.errors,
                partial: self.record,
            })
        }
    }
}

impl From<FrameDecode> for MinuteResult {
    fn from(decode: FrameDecode) -> Self {
        decode.into_result()
    }
}

/// Decode one minute of A and B code bits
///
/// All checks are attempted, and all failures are reported.
pub fn decode_frame(frame: &FrameBuffer) -> FrameDecode {
    let mut errors = FrameDecodeErrs::new();
    let mut record = CalendarRecord::default();
    let mut validation = [FieldValidation::ParityFailed; 4];

    let signature_ok = check_signature(frame);
    if !signature_ok {
        warn!(
            "decode: signature check failed: {:?}",
            frame.a_bits(SIGNATURE_START..SIGNATURE_START + 8).collect::<Vec<u8>>()
        );
        errors.push(FrameDecodeErr::SignatureMismatch);
    }

    for field in Field::iter() {
        let range = field.range();
        if !check_parity(frame, range.start, range.len(), field.parity_idx()) {
            warn!("decode: {} parity failed", field);
            errors.push(FrameDecodeErr::FieldParityFailed(field));
            continue;
        }

        validation[field.ordinal()] = FieldValidation::Valid;
        match field {
            Field::Year => {
                record.year_offset = convert_bcd(frame, 17, 8);
            }
            Field::MonthDay => {
                record.month = convert_bcd(frame, 25, 5);
                record.day_of_month = convert_bcd(frame, 30, 6);
            }
            Field::Weekday => {
                record.day_of_week = convert_bcd(frame, 36, 3);
            }
            Field::HourMinute => {
                record.hour = convert_bcd(frame, 39, 6);
                record.minute = convert_bcd(frame, 45, 7);
            }
        }
    }

    record.dst = frame.b(DST_IDX) == 1;

    FrameDecode {
        record,
        signature_ok,
        validation,
        errors,
    }
}

/// True if the A-code bits at 52..60 are `01111110`
pub fn check_signature(frame: &FrameBuffer) -> bool {
    frame
        .a_bits(SIGNATURE_START..SIGNATURE_START + SIGNATURE.len())
        .eq(SIGNATURE.iter().copied())
}

/// Odd parity check
///
/// Sums the A-code bits in `start..start + length` and the
/// B-code bit at `parity_idx`. MSF parity bits are chosen
/// so that this sum is odd. [`Field::range()`] and
/// [`Field::parity_idx()`] give the arguments for each field.
///
/// # Panics
///
/// Panics if `start + length` exceeds sixty or if
/// `parity_idx` is not less than sixty.
pub fn check_parity(frame: &FrameBuffer, start: usize, length: usize, parity_idx: usize) -> bool {
    let sum: u32 = frame.a_bits(start..start + length).map(u32::from).sum::<u32>()
        + frame.b(parity_idx) as u32;
    sum % 2 == 1
}

/// Convert A-code bits in `start..start + length` to an integer
///
/// The bits are weighted `80, 40, 20, 10, 8, 4, 2, 1`,
/// right-aligned to the field: the last bit always has
/// weight 1.
///
/// # Panics
///
/// Panics if `length` exceeds eight or if `start + length`
/// exceeds sixty.
pub fn convert_bcd(frame: &FrameBuffer, start: usize, length: usize) -> u8 {
    let weights = &BCD_WEIGHTS[BCD_WEIGHTS.len() - length..];
    frame
        .a_bits(start..start + length)
        .zip(weights.iter())
        .map(|(bit, weight)| bit * weight)
        .sum()
}

// comma-separated error list
struct ErrList<'e>(&'e FrameDecodeErrs);

impl fmt::Display for ErrList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}
