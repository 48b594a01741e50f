//! Decoder program logic
//!
//! Input is converted into edges of the receiver line and
//! fed to the [`MsfReceiver`]. Every displayable change is
//! printed by a [`ConsoleDisplay`].
//!
//! ```txt
//!  --file ==> observations ==> EdgeTimer ==> MsfReceiver ==> ConsoleDisplay
//!                  (text or --raw)
//!
//!  --demo ==> waveform ================> MsfReceiver ==> ConsoleDisplay
//! ```

use std::io::{BufRead, Write};

use anyhow::anyhow;
use chrono::{Duration, NaiveDateTime, Timelike, Utc};
use log::{error, info, warn};

use msftime::{
    waveform, BitPair, CalendarRecord, DisplaySink, EdgeEvent, EdgeTimer, MsfReceiver, Snapshot,
};

use crate::cli::Args;
use crate::source;

/// Run the application
///
/// Reads line observations from `input` until it is exhausted,
/// in the format selected by `args`, and shows the receiver's
/// progress on the `display`.
pub fn run<R, S>(args: &Args, receiver: &mut MsfReceiver, input: R, display: &mut S)
where
    R: BufRead,
    S: DisplaySink + ?Sized,
{
    let timer = EdgeTimer::new(args.timestamp_wrap());
    if args.raw {
        receiver.run(
            timer.edges(source::raw_observations(input, args.rate)),
            display,
        );
    } else {
        receiver.run(timer.edges(source::text_observations(input)), display);
    }

    info!(
        "end of input after {} edges; receiver {}",
        receiver.edge_counter(),
        receiver.sync_state()
    );
}

/// Run the demonstration
///
/// Decodes a few minutes of synthetic signal, starting at the
/// current UTC time, and exits.
pub fn run_demo<S>(
    args: &Args,
    receiver: &mut MsfReceiver,
    display: &mut S,
) -> Result<(), anyhow::Error>
where
    S: DisplaySink + ?Sized,
{
    let edges = make_demo_edges(&Utc::now().naive_utc(), args.demo_minutes)?;

    warn!("demonstration (--demo) mode: the following times are NOT LIVE!");
    receiver.run(edges, display);
    Ok(())
}

/// Prints display snapshots to a console
///
/// The default layout is one line per update. The `lcd`
/// layout prints both rows of a 16x2 character display,
/// followed by a blank line.
#[derive(Debug)]
pub struct ConsoleDisplay<W>
where
    W: Write,
{
    out: W,
    quiet: bool,
    lcd: bool,
    failed: bool,
}

impl<W> ConsoleDisplay<W>
where
    W: Write,
{
    /// Display on `out`, unless `quiet`
    pub fn new(out: W, quiet: bool, lcd: bool) -> Self {
        Self {
            out,
            quiet,
            lcd,
            failed: false,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, snapshot: &Snapshot) -> std::io::Result<()> {
        if self.lcd {
            writeln!(self.out, "{:<16}", snapshot.top_row())?;
            writeln!(self.out, "{:<16}", snapshot.bottom_row())?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out, "{}", snapshot)?;
        }
        self.out.flush()
    }
}

impl<W> DisplaySink for ConsoleDisplay<W>
where
    W: Write,
{
    fn show(&mut self, snapshot: &Snapshot) {
        if self.quiet || self.failed {
            return;
        }

        if let Err(err) = self.write(snapshot) {
            error!("unable to write to display: {}", err);
            self.failed = true;
        }
    }
}

// Create the edges of a demonstration signal
//
// The signal begins at `at`, in the middle of some minute, so
// the receiver must wait for sync. It is followed by `minutes`
// whole minutes of time code and the start of the final
// minute marker.
fn make_demo_edges(at: &NaiveDateTime, minutes: u32) -> Result<Vec<EdgeEvent>, anyhow::Error> {
    let mut edges = Vec::with_capacity(minutes as usize * 64 + 128);

    // rest of this minute: unmodulated seconds
    for _sec in at.second()..59 {
        edges.extend(waveform::second_edges(BitPair::ZERO));
    }

    // each minute announces the next one
    let this_minute = at
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .ok_or_else(|| anyhow!("invalid demonstration time {}", at))?;
    for k in 1..=i64::from(minutes) {
        let announce = this_minute + Duration::minutes(k + 1);
        let record = CalendarRecord::from_naive_datetime(&announce, false)
            .ok_or_else(|| anyhow!("unable to encode {} as MSF time", announce))?;
        edges.extend(waveform::minute_edges(&waveform::encode_frame(&record)));
    }
    edges.push(EdgeEvent::low(waveform::MARKER_MS));

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use msftime::{MsfReceiverBuilder, SecondIndex, SyncState, TimeSource};

    fn demo_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(14, 29, 57)
            .unwrap()
    }

    #[test]
    fn test_make_demo_edges() {
        let edges = make_demo_edges(&demo_time(), 2).expect("demo");

        let mut rx = MsfReceiverBuilder::new().build();
        let mut display = ConsoleDisplay::new(Vec::new(), false, false);
        rx.run(edges, &mut display);

        let text = String::from_utf8(display.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Wait for sync... 1");
        assert_eq!(lines[1], "Wait for sync... 2");
        assert!(lines.contains(&"Receiving... 00:00:01"));
        assert!(lines.contains(&"Sat 15 Jun 2024 14:31:00 GMT"));
        assert_eq!(lines.last(), Some(&"Sat 15 Jun 2024 14:32:00 GMT"));
        assert_eq!(rx.snapshot().source(), TimeSource::Decoded);
    }

    #[test]
    fn test_demo_midnight() {
        let at = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 58, 30)
            .unwrap();
        let edges = make_demo_edges(&at, 2).expect("demo");

        let mut rx = MsfReceiverBuilder::new().build();
        let mut last = None;
        for evt in rx.iter(edges) {
            if let Some(rec) = evt.minute_ok() {
                last = Some(*rec);
            }
        }

        let last = last.expect("no minutes decoded");
        assert_eq!(last.year(), 2024);
        assert_eq!(last.month, 1);
        assert_eq!(last.day_of_month, 1);
        assert_eq!((last.hour, last.minute), (0, 1));
    }

    #[test]
    fn test_console_display() {
        let locked = Snapshot::new(
            CalendarRecord {
                year_offset: 24,
                month: 6,
                day_of_month: 15,
                day_of_week: 6,
                hour: 14,
                minute: 30,
                dst: true,
            },
            SecondIndex::new(5),
            SyncState::Locked,
            0,
            TimeSource::Decoded,
        );

        let mut display = ConsoleDisplay::new(Vec::new(), false, true);
        display.show(&locked);
        let text = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(text, "Sat 15 Jun 2024 \n 14:30:05  BST  \n\n");

        let mut display = ConsoleDisplay::new(Vec::new(), true, false);
        display.show(&locked);
        assert!(display.into_inner().is_empty());
    }
}
