//! Full receiver chain

mod output;

#[cfg(not(test))]
use log::{debug, info, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use crate::builder::MsfReceiverBuilder;
use crate::calendar::CalendarRecord;
use crate::decode::{decode_frame, MinuteResult};
use crate::edge::{ClassifierOut, EdgeClassifier, EdgeEvent};
use crate::frame::FrameBuffer;
use crate::sync::{SyncMachine, SyncState};

pub use output::{EventType, ReceiverEvent, Snapshot, TimeSource};

/// A complete MSF receiver
///
/// The receiver takes [`EdgeEvent`]s from a digital MSF
/// receiver module and performs the following operations:
///
/// 1. Edge classification into A/B code bits, minute
///    markers, and end-of-second ticks
/// 2. Storage of one minute of bits
/// 3. Frame decoding at every minute marker
/// 4. Acquisition tracking
/// 5. Time-of-day extrapolation when a minute is bad
///
/// To create the receiver, first create its Builder:
///
/// ```
/// use msftime::{MsfReceiverBuilder, SyncState};
///
/// let receiver = MsfReceiverBuilder::default().build();
/// assert_eq!(receiver.sync_state(), SyncState::AwaitingSignal);
/// ```
///
/// Then bind it to a source of edges with
/// [`iter()`](MsfReceiver::iter) or drive a display with
/// [`run()`](MsfReceiver::run).
#[derive(Clone, Debug)]
pub struct MsfReceiver {
    classifier: EdgeClassifier,
    frame: FrameBuffer,
    sync: SyncMachine,
    display: CalendarRecord,
    source: TimeSource,
    edge_counter: u64,
}

impl MsfReceiver {
    /// Receive MSF time from a source of edges
    ///
    /// Bind an iterator which will consume the `input` and
    /// produce [`ReceiverEvent`]s, which include:
    ///
    /// * wait counter updates before acquisition,
    /// * acquisition and lock,
    /// * every second while locked; and
    /// * every decoded (or failed) minute
    ///
    /// The iterator will consume as many edges of `input` as
    /// are required to produce the next event. It will return
    /// `None` if the input is exhausted.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<'rx, I, T>(&'rx mut self, input: I) -> SourceIter<'rx, T>
    where
        I: IntoIterator<Item = EdgeEvent> + IntoIterator<IntoIter = T>,
        T: Iterator<Item = EdgeEvent>,
    {
        SourceIter {
            source: input.into_iter(),
            receiver: self,
        }
    }

    /// Drive a display from a source of edges
    ///
    /// Consumes `input` until it is exhausted. Every event which
    /// [is displayable](ReceiverEvent::is_displayable) is
    /// shown on the `sink`.
    pub fn run<I, S>(&mut self, input: I, sink: &mut S)
    where
        I: IntoIterator<Item = EdgeEvent>,
        S: DisplaySink + ?Sized,
    {
        for evt in self.iter(input) {
            if evt.is_displayable() {
                sink.show(evt.snapshot());
            }
        }
    }

    /// Process one edge
    ///
    /// Returns an event if the receiver's state changed.
    pub fn input(&mut self, edge: &EdgeEvent) -> Option<ReceiverEvent> {
        self.edge_counter = self.edge_counter.wrapping_add(1);

        let lost = self.sync.elapse(edge.duration_ms).is_some();
        if lost {
            self.classifier.reset();
        }

        let what = match self.classifier.input(edge, &mut self.frame) {
            ClassifierOut::Ignored | ClassifierOut::Bits(..) => None,
            ClassifierOut::Waiting(count) => Some(EventType::Waiting(count)),
            ClassifierOut::SequenceStart => {
                self.sync.sequence_start();
                Some(EventType::Acquired)
            }
            ClassifierOut::Tick(sec) => match self.sync.second_tick() {
                Some(SyncState::Locked) => Some(EventType::Locked),
                _ if self.sync.is_locked() => Some(EventType::Tick(sec)),
                _ => None,
            },
            ClassifierOut::MinuteBoundary => Some(EventType::Minute(self.end_of_minute())),
        };

        let what = if lost {
            Some(EventType::SignalLost)
        } else {
            what
        };

        what.map(|what| ReceiverEvent::new(what, self.snapshot(), self.edge_counter))
    }

    /// Current display contents
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.display,
            self.classifier.second(),
            self.sync.state(),
            self.classifier.wait_count(),
            self.source,
        )
    }

    /// Acquisition state
    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// The minute frame being collected
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Lock timeout, in milliseconds, if any
    pub fn lock_timeout(&self) -> Option<u64> {
        self.sync.lock_timeout()
    }

    /// Lifetime total input edge counter
    pub fn edge_counter(&self) -> u64 {
        self.edge_counter
    }

    /// Clear all state and await signal
    pub fn reset(&mut self) {
        self.classifier = EdgeClassifier::new();
        self.frame.reset();
        self.sync.reset();
        self.display = CalendarRecord::default();
        self.source = TimeSource::Unknown;
        self.edge_counter = 0;
    }

    // Decode the finished minute
    //
    // A good minute replaces the displayed time outright. A
    // bad one never contributes fields; the displayed time
    // is advanced by one minute instead.
    fn end_of_minute(&mut self) -> MinuteResult {
        let result = decode_frame(&self.frame).into_result();
        match &result {
            Ok(rec) => {
                info!("minute: {}", rec);
                self.display = *rec;
                self.source = TimeSource::Decoded;
            }
            Err(err) => {
                self.display.advance_minute();
                if self.source != TimeSource::Unknown {
                    self.source = TimeSource::Extrapolated;
                }
                warn!(
                    "{}; extrapolating to {:02}:{:02}",
                    err, self.display.hour, self.display.minute
                );
            }
        }
        result
    }
}

impl From<&MsfReceiverBuilder> for MsfReceiver {
    /// Create the MSF Receiver from its Builder
    fn from(cfg: &MsfReceiverBuilder) -> Self {
        Self {
            classifier: EdgeClassifier::new(),
            frame: FrameBuffer::new(),
            sync: SyncMachine::new(cfg.lock_timeout()),
            display: CalendarRecord::default(),
            source: TimeSource::Unknown,
            edge_counter: 0,
        }
    }
}

/// Receives display updates
///
/// Implemented for any `FnMut(&Snapshot)`, so a closure can
/// be used as a sink.
pub trait DisplaySink {
    /// Show the given contents
    fn show(&mut self, snapshot: &Snapshot);
}

impl<F> DisplaySink for F
where
    F: FnMut(&Snapshot),
{
    fn show(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Edge source iterator
///
/// This iterator is bound to a source of [`EdgeEvent`]s.
/// Calling the `next()` method will return the next
/// [`ReceiverEvent`] from the receiver or `None` if the
/// available edges have been consumed without any new
/// events.
#[derive(Debug)]
pub struct SourceIter<'rx, I>
where
    I: Iterator<Item = EdgeEvent>,
{
    source: I,
    receiver: &'rx mut MsfReceiver,
}

impl<'rx, I> Iterator for SourceIter<'rx, I>
where
    I: Iterator<Item = EdgeEvent>,
{
    type Item = ReceiverEvent;

    fn next(&mut self) -> Option<Self::Item> {
        for edge in &mut self.source {
            if let Some(out) = self.receiver.input(&edge) {
                debug!("receiver {}", out);
                return Some(out);
            }
        }

        None
    }
}
