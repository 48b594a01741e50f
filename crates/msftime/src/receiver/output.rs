use std::fmt;

use crate::calendar::CalendarRecord;
use crate::decode::MinuteResult;
use crate::frame::SecondIndex;
use crate::sync::SyncState;

/// MSF receiver status
///
/// Emitted by the [`MsfReceiver`](crate::MsfReceiver)
/// whenever something changes. The
/// [`what()`](ReceiverEvent::what) method returns the event.
/// The [`snapshot()`](ReceiverEvent::snapshot) is what a
/// clock display should show after the event.
///
/// Not every event should be displayed. See
/// [`is_displayable()`](ReceiverEvent::is_displayable).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReceiverEvent {
    what: EventType,
    snapshot: Snapshot,
    edge_counter: u64,
}

impl ReceiverEvent {
    /// The event which triggered the output
    pub fn what(&self) -> &EventType {
        &self.what
    }

    /// Display contents after this event
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Minute decode result, if this event ends a minute
    pub fn minute(&self) -> Option<&MinuteResult> {
        match self.what() {
            EventType::Minute(res) => Some(res),
            _ => None,
        }
    }

    /// Successfully-decoded minute, if any
    pub fn minute_ok(&self) -> Option<&CalendarRecord> {
        self.minute()?.as_ref().ok()
    }

    /// Consume event, returning the minute decode result, if any
    pub fn into_minute(self) -> Option<MinuteResult> {
        match self.what {
            EventType::Minute(res) => Some(res),
            _ => None,
        }
    }

    /// True if a display should be updated
    ///
    /// Wait counter changes, lock acquisition, per-second
    /// ticks, and loss of signal are always shown. A minute is
    /// shown only while `Locked`.
    pub fn is_displayable(&self) -> bool {
        match self.what {
            EventType::Acquired => false,
            EventType::Minute(_) => self.snapshot.sync() == SyncState::Locked,
            _ => true,
        }
    }

    /// Event time, measured in edges
    ///
    /// Reports the "time" of the event using a monotonic count
    /// of input edges.
    pub fn edge_counter(&self) -> u64 {
        self.edge_counter
    }
}

impl ReceiverEvent {
    /// Create from event, display contents, and time
    pub(crate) fn new(what: EventType, snapshot: Snapshot, edge_counter: u64) -> Self {
        Self {
            what,
            snapshot,
            edge_counter,
        }
    }
}

impl From<ReceiverEvent> for Option<MinuteResult> {
    fn from(rx: ReceiverEvent) -> Self {
        rx.into_minute()
    }
}

impl fmt::Display for ReceiverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:<10}]: event {}", self.edge_counter, self.what())
    }
}

/// Type of event
///
/// See [`ReceiverEvent`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EventType {
    /// Still awaiting signal; whole seconds counted so far
    Waiting(u64),

    /// First long pulse seen; now counting seconds
    Acquired,

    /// Receiving a live cadence of seconds
    Locked,

    /// One second has passed while locked
    Tick(SecondIndex),

    /// A minute marker ended the minute
    ///
    /// Contains the decoded minute or the reasons it could
    /// not be decoded. On failure, the displayed time was
    /// extrapolated by one minute instead.
    Minute(MinuteResult),

    /// The lock timed out. Awaiting signal again.
    SignalLost,
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        match self {
            EventType::Waiting(_) => "waiting",
            EventType::Acquired => "acquired",
            EventType::Locked => "locked",
            EventType::Tick(_) => "tick",
            EventType::Minute(Ok(_)) => "minute",
            EventType::Minute(Err(_)) => "decode error",
            EventType::SignalLost => "signal lost",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Waiting(count) => write!(f, "{}: {}", self.as_ref(), count),
            EventType::Tick(sec) => write!(f, "{}: {}", self.as_ref(), sec),
            EventType::Minute(Ok(rec)) => write!(f, "{}: {}", self.as_ref(), rec),
            EventType::Minute(Err(err)) => write!(f, "{}: {}", self.as_ref(), err),
            _ => write!(f, "{}", self.as_ref()),
        }
    }
}

/// Where the displayed time came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeSource {
    /// No minute has been decoded yet
    #[default]
    Unknown,

    /// The last minute decoded successfully
    Decoded,

    /// Advanced from an earlier good minute
    Extrapolated,
}

/// What a clock display should show
///
/// Renders as one line of text with `Display`, or as the two
/// rows of a 16×2 character display with
/// [`top_row()`](Snapshot::top_row) and
/// [`bottom_row()`](Snapshot::bottom_row).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Snapshot {
    record: CalendarRecord,
    second: SecondIndex,
    sync: SyncState,
    wait_count: u64,
    source: TimeSource,
}

impl Snapshot {
    /// Create display contents
    pub fn new(
        record: CalendarRecord,
        second: SecondIndex,
        sync: SyncState,
        wait_count: u64,
        source: TimeSource,
    ) -> Self {
        Self {
            record,
            second,
            sync,
            wait_count,
            source,
        }
    }

    /// Displayed date and time, to the minute
    pub fn record(&self) -> &CalendarRecord {
        &self.record
    }

    /// Day of week (`0` = Sunday)
    pub fn weekday(&self) -> u8 {
        self.record.day_of_week
    }

    /// Day of month
    pub fn day(&self) -> u8 {
        self.record.day_of_month
    }

    /// Month of year
    pub fn month(&self) -> u8 {
        self.record.month
    }

    /// Four-digit year
    pub fn year(&self) -> u16 {
        self.record.year()
    }

    /// Hour of day
    pub fn hour(&self) -> u8 {
        self.record.hour
    }

    /// Minute of hour
    pub fn minute(&self) -> u8 {
        self.record.minute
    }

    /// Second of minute
    pub fn second(&self) -> SecondIndex {
        self.second
    }

    /// British Summer Time in effect
    pub fn dst(&self) -> bool {
        self.record.dst
    }

    /// Acquisition state
    pub fn sync(&self) -> SyncState {
        self.sync
    }

    /// Whole seconds counted while awaiting signal
    pub fn wait_count(&self) -> u64 {
        self.wait_count
    }

    /// Where the time came from
    pub fn source(&self) -> TimeSource {
        self.source
    }

    /// Time as `HH:MM:SS`
    pub fn time_string(&self) -> String {
        format!(
            "{:02}:{:02}:{}",
            self.record.hour, self.record.minute, self.second
        )
    }

    /// First row of a 16×2 display
    pub fn top_row(&self) -> String {
        match (self.sync, self.source) {
            (SyncState::AwaitingSignal, _) => "Wait for sync...".to_owned(),
            (_, TimeSource::Unknown) => "Receiving...".to_owned(),
            _ => self.record.date_string(),
        }
    }

    /// Second row of a 16×2 display
    pub fn bottom_row(&self) -> String {
        match (self.sync, self.source) {
            (SyncState::AwaitingSignal, _) => format!("{:>8}", self.wait_count),
            (_, TimeSource::Unknown) => format!(" {} ", self.time_string()),
            _ => format!(" {}  {}", self.time_string(), self.record.timezone_str()),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.sync, self.source) {
            (SyncState::AwaitingSignal, _) => {
                write!(f, "Wait for sync... {}", self.wait_count)
            }
            (_, TimeSource::Unknown) => write!(f, "Receiving... {}", self.time_string()),
            (_, source) => {
                write!(
                    f,
                    "{} {} {}",
                    self.record.date_string(),
                    self.time_string(),
                    self.record.timezone_str()
                )?;
                if source == TimeSource::Extrapolated {
                    write!(f, " (extrapolated)")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CalendarRecord {
        CalendarRecord {
            year_offset: 24,
            month: 6,
            day_of_month: 15,
            day_of_week: 3,
            hour: 14,
            minute: 30,
            dst: true,
        }
    }

    #[test]
    fn test_snapshot_display() {
        let waiting = Snapshot::new(
            CalendarRecord::default(),
            SecondIndex::ZERO,
            SyncState::AwaitingSignal,
            42,
            TimeSource::Unknown,
        );
        assert_eq!(waiting.to_string(), "Wait for sync... 42");
        assert_eq!(waiting.top_row(), "Wait for sync...");
        assert_eq!(waiting.bottom_row(), "      42");

        let receiving = Snapshot::new(
            CalendarRecord::default(),
            SecondIndex::new(7),
            SyncState::Locked,
            42,
            TimeSource::Unknown,
        );
        assert_eq!(receiving.to_string(), "Receiving... 00:00:07");

        let good = Snapshot::new(
            record(),
            SecondIndex::new(5),
            SyncState::Locked,
            0,
            TimeSource::Decoded,
        );
        assert_eq!(good.to_string(), "Wed 15 Jun 2024 14:30:05 BST");
        assert_eq!(good.top_row(), "Wed 15 Jun 2024");
        assert_eq!(good.bottom_row(), " 14:30:05  BST");
        assert_eq!(good.year(), 2024);
        assert_eq!(good.second().get(), 5);
        assert!(good.dst());

        let guess = Snapshot::new(
            record(),
            SecondIndex::ZERO,
            SyncState::Locked,
            0,
            TimeSource::Extrapolated,
        );
        assert_eq!(
            guess.to_string(),
            "Wed 15 Jun 2024 14:30:00 BST (extrapolated)"
        );
    }

    #[test]
    fn test_event_displayable() {
        let locked = Snapshot::new(
            record(),
            SecondIndex::ZERO,
            SyncState::Locked,
            0,
            TimeSource::Decoded,
        );
        let seen = Snapshot::new(
            record(),
            SecondIndex::ZERO,
            SyncState::MarkerSeen,
            0,
            TimeSource::Decoded,
        );

        let evt = ReceiverEvent::new(EventType::Minute(Ok(record())), locked, 10);
        assert!(evt.is_displayable());
        assert_eq!(evt.minute_ok(), Some(&record()));
        assert_eq!(evt.to_string(), "[10        ]: event minute: Wed 15 Jun 2024 14:30 BST");

        let evt = ReceiverEvent::new(EventType::Minute(Ok(record())), seen, 10);
        assert!(!evt.is_displayable());

        let evt = ReceiverEvent::new(EventType::Acquired, seen, 11);
        assert!(!evt.is_displayable());
        assert_eq!(evt.minute(), None);

        let evt = ReceiverEvent::new(EventType::Tick(SecondIndex::new(3)), locked, 12);
        assert!(evt.is_displayable());
        assert_eq!(evt.what().to_string(), "tick: 03");
        assert_eq!(Option::<MinuteResult>::from(evt), None);
    }
}
