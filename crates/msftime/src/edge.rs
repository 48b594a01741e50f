//! Edge timing and classification
//!
//! The MSF receiver module drives a digital line which is
//! *high* while the 60 kHz carrier is switched off. Each
//! second begins with the carrier off, and the length of
//! the off period carries the A and B code bits:
//!
//! ```txt
//! carrier off   meaning
//! -----------   -------------------------------------
//! 500 ms        minute marker (second zero)
//! 100 ms        A=0 B=0
//! 200 ms        A=1 B=0
//! 300 ms        A=1 B=1
//! 100+100+100   A=0 B=1 (off, on, off)
//! ```
//!
//! An [`EdgeEvent`] reports the level the line has just
//! changed *to*, along with how long the line held the
//! opposite level before the change. A falling edge after
//! 500 ms is therefore the minute marker, and a rising edge
//! after the long carrier-on period ends the second.

use std::fmt;

#[cfg(not(test))]
use log::{debug, trace, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as trace;
#[cfg(test)]
use std::println as warn;

use thiserror::Error;

use crate::frame::{BitPair, FrameBuffer, SecondIndex};

/// Digital line level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// Line is low (`0`)
    Low,

    /// Line is high (`1`)
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "0"),
            Level::High => write!(f, "1"),
        }
    }
}

/// A change in line level
///
/// `level` is the level of the line *after* the change.
/// `duration_ms` is how long the line held the previous
/// level, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeEvent {
    /// New line level
    pub level: Level,

    /// Time since the previous change, in milliseconds
    pub duration_ms: u64,
}

impl EdgeEvent {
    /// Line went to `level` after `duration_ms`
    pub fn new(level: Level, duration_ms: u64) -> Self {
        Self { level, duration_ms }
    }

    /// Line went low after `duration_ms`
    pub fn low(duration_ms: u64) -> Self {
        Self::new(Level::Low, duration_ms)
    }

    /// Line went high after `duration_ms`
    pub fn high(duration_ms: u64) -> Self {
        Self::new(Level::High, duration_ms)
    }
}

impl fmt::Display for EdgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} ms", self.level, self.duration_ms)
    }
}

/// An edge which matches no known pulse width
///
/// The receiver ignores these edges. Jitter outside the
/// tolerance windows drops the edge; it never corrupts
/// the frame buffer.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[error("edge out of tolerance: {level} after {duration_ms} ms")]
pub struct EdgeOutOfTolerance {
    /// New line level
    pub level: Level,

    /// Time since the previous change, in milliseconds
    pub duration_ms: u64,
}

impl From<&EdgeEvent> for EdgeOutOfTolerance {
    fn from(edge: &EdgeEvent) -> Self {
        Self {
            level: edge.level,
            duration_ms: edge.duration_ms,
        }
    }
}

/// Meaning of one edge, once synchronized
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeClass {
    /// The 500 ms minute marker: second zero begins
    MinuteMarker,

    /// Provisional bits for the current second
    ///
    /// A later [`Complete`](EdgeClass::Complete) in the same
    /// second takes precedence.
    Provisional(BitPair),

    /// Final bits for the current second
    ///
    /// Only the `A=0 B=1` symbol, which needs two carrier-off
    /// pulses, is completed this way.
    Complete(BitPair),

    /// The carrier-on period which ends each second
    SecondTick,
}

/// Classify one edge by its level and duration
///
/// Bounds are exclusive on both ends.
pub fn classify(edge: &EdgeEvent) -> Result<EdgeClass, EdgeOutOfTolerance> {
    let d = edge.duration_ms;
    match edge.level {
        Level::Low => {
            if d > 450 && d < 550 {
                Ok(EdgeClass::MinuteMarker)
            } else if d > 250 && d < 350 {
                Ok(EdgeClass::Provisional(BitPair::new(true, true)))
            } else if d > 150 && d < 250 {
                Ok(EdgeClass::Provisional(BitPair::new(true, false)))
            } else if d > 50 && d < 150 {
                Ok(EdgeClass::Provisional(BitPair::new(false, false)))
            } else {
                Err(edge.into())
            }
        }
        Level::High => {
            if d > 50 && d < 150 {
                Ok(EdgeClass::Complete(BitPair::new(false, true)))
            } else if d > 450 {
                Ok(EdgeClass::SecondTick)
            } else {
                Err(edge.into())
            }
        }
    }
}

/// Result of feeding one edge to the [`EdgeClassifier`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassifierOut {
    /// The edge had no effect
    Ignored,

    /// Still waiting for the first long pulse; payload is
    /// the updated wait counter
    Waiting(u64),

    /// The first long pulse was seen and second zero begins
    SequenceStart,

    /// Bits were written for the current second
    Bits(SecondIndex, BitPair),

    /// The second index advanced to the payload
    Tick(SecondIndex),

    /// A minute marker was seen. The frame buffer holds the
    /// whole of the previous minute.
    MinuteBoundary,
}

/// Writes classified edges into a [`FrameBuffer`]
///
/// Until the first long low edge, the classifier is in a
/// pre-sync mode where it only counts whole seconds so that
/// a display can show some sign of life. Afterwards it tracks
/// the second-of-minute and writes each second's bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeClassifier {
    started: bool,
    second: SecondIndex,
    slot_complete: bool,
    ms_since_marker: u64,
    wait_count: u64,
}

// a marker this soon after the last one is jitter
const MARKER_HOLDOFF_MS: u64 = 1500;

impl EdgeClassifier {
    /// New classifier in pre-sync mode
    pub fn new() -> Self {
        Self {
            started: false,
            second: SecondIndex::ZERO,
            slot_complete: false,
            ms_since_marker: 0,
            wait_count: 0,
        }
    }

    /// Return to pre-sync mode
    ///
    /// The wait counter is retained.
    pub fn reset(&mut self) {
        self.started = false;
        self.second = SecondIndex::ZERO;
        self.slot_complete = false;
        self.ms_since_marker = 0;
    }

    /// True once the first long low edge has been seen
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Current second-of-minute
    pub fn second(&self) -> SecondIndex {
        self.second
    }

    /// Number of whole seconds seen before sync started
    pub fn wait_count(&self) -> u64 {
        self.wait_count
    }

    /// Handle one edge
    ///
    /// Writes to `frame` at the current second. Edges outside
    /// every tolerance window leave the frame and the second
    /// untouched; only their duration is counted towards the
    /// marker holdoff.
    pub fn input(&mut self, edge: &EdgeEvent, frame: &mut FrameBuffer) -> ClassifierOut {
        if !self.started {
            return self.input_presync(edge, frame);
        }

        self.ms_since_marker = self.ms_since_marker.saturating_add(edge.duration_ms);

        let class = match classify(edge) {
            Ok(class) => class,
            Err(e) => {
                trace!("edge: {}", e);
                return ClassifierOut::Ignored;
            }
        };

        match class {
            EdgeClass::MinuteMarker => {
                if self.ms_since_marker < MARKER_HOLDOFF_MS {
                    debug!(
                        "edge: duplicate minute marker ignored ({} ms after last)",
                        self.ms_since_marker
                    );
                    return ClassifierOut::Ignored;
                }
                self.start_minute(frame);
                debug!("edge: minute marker");
                ClassifierOut::MinuteBoundary
            }
            EdgeClass::Provisional(bits) => {
                if self.slot_complete {
                    return ClassifierOut::Ignored;
                }
                frame.set(self.second, bits);
                ClassifierOut::Bits(self.second, bits)
            }
            EdgeClass::Complete(bits) => {
                frame.set(self.second, bits);
                self.slot_complete = true;
                ClassifierOut::Bits(self.second, bits)
            }
            EdgeClass::SecondTick => {
                self.second.advance();
                self.slot_complete = false;
                trace!("edge: T={}", self.second);
                ClassifierOut::Tick(self.second)
            }
        }
    }

    fn input_presync(&mut self, edge: &EdgeEvent, frame: &mut FrameBuffer) -> ClassifierOut {
        match edge.level {
            Level::Low if edge.duration_ms > 450 => {
                debug!("edge: sequence start");
                self.started = true;
                self.start_minute(frame);
                ClassifierOut::SequenceStart
            }
            Level::High if edge.duration_ms > 450 => {
                self.wait_count += 1;
                trace!("edge: wait {}", self.wait_count);
                ClassifierOut::Waiting(self.wait_count)
            }
            _ => ClassifierOut::Ignored,
        }
    }

    fn start_minute(&mut self, frame: &mut FrameBuffer) {
        self.second = SecondIndex::ZERO;
        self.slot_complete = false;
        self.ms_since_marker = 0;
        frame.set(SecondIndex::ZERO, BitPair::ZERO);
    }
}

impl Default for EdgeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts sampled line levels into [`EdgeEvent`]s
///
/// Feed the timer every observation of the line, with a
/// monotonic millisecond timestamp. An event is produced
/// only when the level changes; its duration is the time
/// since the previous change. The very first observation
/// only establishes the initial level.
///
/// If the timestamp source is a counter which wraps, such as
/// a 32-bit millisecond tick, give its modulus to
/// [`new()`](EdgeTimer::new) so that intervals spanning the
/// wrap are measured correctly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeTimer {
    last: Option<(Level, u64)>,
    wrap: Option<u64>,
}

impl EdgeTimer {
    /// New timer for timestamps which wrap at `wrap`, if any
    pub fn new(wrap: Option<u64>) -> Self {
        Self { last: None, wrap }
    }

    /// Observe the line at `level` at time `timestamp_ms`
    pub fn observe(&mut self, level: Level, timestamp_ms: u64) -> Option<EdgeEvent> {
        match self.last {
            None => {
                self.last = Some((level, timestamp_ms));
                None
            }
            Some((last_level, _)) if last_level == level => None,
            Some((_, last_ts)) => {
                self.last = Some((level, timestamp_ms));
                Some(EdgeEvent::new(level, self.elapsed(last_ts, timestamp_ms)))
            }
        }
    }

    /// Adapt an iterator of `(level, timestamp_ms)` observations
    /// into an iterator of edges
    pub fn edges<I>(mut self, observations: I) -> impl Iterator<Item = EdgeEvent>
    where
        I: IntoIterator<Item = (Level, u64)>,
    {
        observations
            .into_iter()
            .filter_map(move |(level, ts)| self.observe(level, ts))
    }

    /// Forget the last observation
    pub fn reset(&mut self) {
        self.last = None;
    }

    fn elapsed(&self, t0: u64, t1: u64) -> u64 {
        if t1 >= t0 {
            t1 - t0
        } else if let Some(wrap) = self.wrap {
            wrap.saturating_sub(t0).wrapping_add(t1)
        } else {
            warn!("edge timer: timestamp went backwards ({} → {})", t0, t1);
            0
        }
    }
}

impl Default for EdgeTimer {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::frame::MINUTE_SECONDS;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&EdgeEvent::low(500)),
            Ok(EdgeClass::MinuteMarker)
        );
        assert_eq!(
            classify(&EdgeEvent::low(300)),
            Ok(EdgeClass::Provisional(BitPair::new(true, true)))
        );
        assert_eq!(
            classify(&EdgeEvent::low(200)),
            Ok(EdgeClass::Provisional(BitPair::new(true, false)))
        );
        assert_eq!(
            classify(&EdgeEvent::low(100)),
            Ok(EdgeClass::Provisional(BitPair::new(false, false)))
        );
        assert_eq!(
            classify(&EdgeEvent::high(100)),
            Ok(EdgeClass::Complete(BitPair::new(false, true)))
        );
        assert_eq!(classify(&EdgeEvent::high(900)), Ok(EdgeClass::SecondTick));
        assert_eq!(classify(&EdgeEvent::high(5000)), Ok(EdgeClass::SecondTick));

        // window edges are exclusive
        assert!(classify(&EdgeEvent::low(450)).is_err());
        assert!(classify(&EdgeEvent::low(550)).is_err());
        assert!(classify(&EdgeEvent::low(250)).is_err());
        assert!(classify(&EdgeEvent::low(50)).is_err());
        assert!(classify(&EdgeEvent::high(450)).is_err());

        // gaps between windows
        assert_eq!(
            classify(&EdgeEvent::low(400)),
            Err(EdgeOutOfTolerance {
                level: Level::Low,
                duration_ms: 400
            })
        );
        assert!(classify(&EdgeEvent::low(10)).is_err());
        assert!(classify(&EdgeEvent::low(2000)).is_err());
        assert!(classify(&EdgeEvent::high(300)).is_err());
    }

    #[test]
    fn test_presync_wait_count() {
        let mut frame = FrameBuffer::new();
        let mut clf = EdgeClassifier::new();

        // long high edges only count
        for i in 1..=10 {
            assert_eq!(
                clf.input(&EdgeEvent::high(900), &mut frame),
                ClassifierOut::Waiting(i)
            );
            assert!(!clf.is_started());
        }

        // short edges of either level are ignored
        assert_eq!(
            clf.input(&EdgeEvent::low(100), &mut frame),
            ClassifierOut::Ignored
        );
        assert_eq!(
            clf.input(&EdgeEvent::high(100), &mut frame),
            ClassifierOut::Ignored
        );
        assert_eq!(clf.wait_count(), 10);
        assert_eq!(frame, FrameBuffer::new());

        // any long low edge starts the sequence
        assert_eq!(
            clf.input(&EdgeEvent::low(700), &mut frame),
            ClassifierOut::SequenceStart
        );
        assert!(clf.is_started());
        assert_eq!(clf.second(), SecondIndex::ZERO);

        // and now high edges tick the seconds
        assert_eq!(
            clf.input(&EdgeEvent::high(500), &mut frame),
            ClassifierOut::Tick(SecondIndex::new(1))
        );
        assert_eq!(clf.wait_count(), 10);
    }

    #[test]
    fn test_bits_written_to_current_second() {
        let mut frame = FrameBuffer::new();
        let mut clf = EdgeClassifier::new();
        clf.input(&EdgeEvent::low(500), &mut frame);
        clf.input(&EdgeEvent::high(500), &mut frame);

        // second 1: A=1 B=1
        assert_eq!(
            clf.input(&EdgeEvent::low(300), &mut frame),
            ClassifierOut::Bits(SecondIndex::new(1), BitPair::new(true, true))
        );
        clf.input(&EdgeEvent::high(700), &mut frame);

        // second 2: A=1 B=0
        clf.input(&EdgeEvent::low(200), &mut frame);
        clf.input(&EdgeEvent::high(800), &mut frame);

        // second 3: A=0 B=1, as off-on-off
        clf.input(&EdgeEvent::low(100), &mut frame);
        assert_eq!(frame.get(SecondIndex::new(3)), BitPair::ZERO);
        clf.input(&EdgeEvent::high(100), &mut frame);
        assert_eq!(
            clf.input(&EdgeEvent::low(100), &mut frame),
            ClassifierOut::Ignored
        );
        clf.input(&EdgeEvent::high(700), &mut frame);

        // second 4: A=0 B=0
        clf.input(&EdgeEvent::low(100), &mut frame);
        clf.input(&EdgeEvent::high(900), &mut frame);

        assert_eq!(frame.get(SecondIndex::new(1)), BitPair::new(true, true));
        assert_eq!(frame.get(SecondIndex::new(2)), BitPair::new(true, false));
        assert_eq!(frame.get(SecondIndex::new(3)), BitPair::new(false, true));
        assert_eq!(frame.get(SecondIndex::new(4)), BitPair::ZERO);
        assert_eq!(clf.second(), SecondIndex::new(5));
    }

    #[test]
    fn test_out_of_tolerance_ignored() {
        let mut frame = FrameBuffer::new();
        let mut clf = EdgeClassifier::new();
        clf.input(&EdgeEvent::low(500), &mut frame);
        clf.input(&EdgeEvent::high(500), &mut frame);
        clf.input(&EdgeEvent::low(300), &mut frame);

        let before = (clf.second(), frame.clone());
        for edge in [
            EdgeEvent::low(400),
            EdgeEvent::low(20),
            EdgeEvent::low(9000),
            EdgeEvent::high(300),
            EdgeEvent::high(0),
        ] {
            assert_eq!(clf.input(&edge, &mut frame), ClassifierOut::Ignored);
        }
        assert_eq!(before, (clf.second(), frame));
    }

    #[test]
    fn test_second_index_wraps_without_marker() {
        let mut frame = FrameBuffer::new();
        let mut clf = EdgeClassifier::new();
        clf.input(&EdgeEvent::low(500), &mut frame);
        for _i in 0..(3 * MINUTE_SECONDS + 7) {
            match clf.input(&EdgeEvent::high(900), &mut frame) {
                ClassifierOut::Tick(sec) => assert!(sec.get() < MINUTE_SECONDS),
                _ => unreachable!(),
            }
        }
        assert_eq!(clf.second().get(), 7);
    }

    #[test]
    fn test_minute_marker_debounce() {
        let mut frame = FrameBuffer::new();
        let mut clf = EdgeClassifier::new();
        clf.input(&EdgeEvent::low(500), &mut frame);
        for _i in 0..MINUTE_SECONDS {
            clf.input(&EdgeEvent::high(900), &mut frame);
        }

        assert_eq!(
            clf.input(&EdgeEvent::low(500), &mut frame),
            ClassifierOut::MinuteBoundary
        );
        assert_eq!(
            clf.input(&EdgeEvent::low(500), &mut frame),
            ClassifierOut::Ignored
        );
        assert_eq!(clf.second(), SecondIndex::ZERO);

        // once the holdoff has passed, markers count again
        clf.input(&EdgeEvent::high(500), &mut frame);
        assert_eq!(
            clf.input(&EdgeEvent::low(500), &mut frame),
            ClassifierOut::MinuteBoundary
        );
    }

    #[test]
    fn test_marker_after_tickless_minute() {
        let mut frame = FrameBuffer::new();
        let mut clf = EdgeClassifier::new();
        assert_eq!(
            clf.input(&EdgeEvent::low(500), &mut frame),
            ClassifierOut::SequenceStart
        );

        // interference chops every carrier-on period short,
        // so no second is ever counted
        for _i in 1..MINUTE_SECONDS {
            clf.input(&EdgeEvent::low(100), &mut frame);
            assert_eq!(
                clf.input(&EdgeEvent::high(400), &mut frame),
                ClassifierOut::Ignored
            );
        }
        assert_eq!(clf.second(), SecondIndex::ZERO);

        // the next real marker still ends the minute
        assert_eq!(
            clf.input(&EdgeEvent::low(500), &mut frame),
            ClassifierOut::MinuteBoundary
        );
    }

    #[test]
    fn test_marker_clears_slot_zero() {
        let mut frame = FrameBuffer::new();
        frame.set(SecondIndex::ZERO, BitPair::new(true, true));
        let mut clf = EdgeClassifier::new();
        clf.input(&EdgeEvent::low(480), &mut frame);
        assert_eq!(frame.get(SecondIndex::ZERO), BitPair::ZERO);
    }

    #[test]
    fn test_edge_timer() {
        let mut timer = EdgeTimer::new(None);
        assert_eq!(timer.observe(Level::Low, 1000), None);
        assert_eq!(timer.observe(Level::Low, 1010), None);
        assert_eq!(
            timer.observe(Level::High, 1500),
            Some(EdgeEvent::high(500))
        );
        assert_eq!(timer.observe(Level::High, 1600), None);
        assert_eq!(timer.observe(Level::Low, 2000), Some(EdgeEvent::low(500)));

        // backwards time without a wrap modulus
        assert_eq!(timer.observe(Level::High, 10), Some(EdgeEvent::high(0)));
    }

    #[test]
    fn test_edge_timer_wrap() {
        const WRAP: u64 = 1 << 32;
        let mut timer = EdgeTimer::new(Some(WRAP));
        timer.observe(Level::High, WRAP - 100);
        assert_eq!(timer.observe(Level::Low, 200), Some(EdgeEvent::low(300)));
    }

    #[test]
    fn test_edge_timer_iter() {
        let obs = vec![
            (Level::Low, 0),
            (Level::High, 100),
            (Level::High, 150),
            (Level::Low, 400),
            (Level::High, 1000),
        ];
        let edges: Vec<EdgeEvent> = EdgeTimer::default().edges(obs).collect();
        assert_eq!(
            edges,
            vec![
                EdgeEvent::high(100),
                EdgeEvent::low(300),
                EdgeEvent::high(600)
            ]
        );
    }
}
