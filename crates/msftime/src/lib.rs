//! # msftime: UK MSF Time Signal Decoding
//!
//! This crate decodes the
//! [MSF time signal](https://en.wikipedia.org/wiki/Time_from_NPL_(MSF))
//! broadcast from Anthorn, UK on 60 kHz. It reconstructs the
//! calendar date and time-of-day from the on/off keying of the
//! carrier and tracks whether the decoded time can be trusted.
//!
//! ## Example
//!
//! You will need an MSF receiver module, which demodulates the
//! carrier into a digital line that is *high* while the carrier
//! is switched off. Obtaining transitions of that line, with
//! millisecond timestamps, is beyond the scope of this crate.
//! On a computer you might sample a GPIO pin; on a
//! microcontroller you might timestamp pin-change interrupts.
//!
//! ```
//! use msftime::{EdgeTimer, Level, MsfReceiverBuilder};
//!
//! # let some_gpio_sampler = || std::iter::once((Level::Low, 0u64));
//! // create a receiver
//! let mut rx = MsfReceiverBuilder::new().build();
//!
//! // let gpio be an iterator of (level, timestamp in ms)
//! // observations. The EdgeTimer converts level changes
//! // into edges with durations.
//! let gpio = some_gpio_sampler();
//! let edges = EdgeTimer::new(None).edges(gpio);
//! for evt in rx.iter(edges) {
//!     if let Some(Ok(time)) = evt.minute() {
//!         println!("the time is now {}", time);
//!     }
//! }
//! ```
//!
//! The receiver emits a [`ReceiverEvent`] whenever its state
//! changes. Every event carries a [`Snapshot`] of what a clock
//! display should show. If you just want to run a display, pass
//! the edges and a [`DisplaySink`] to
//! [`run()`](MsfReceiver::run):
//!
//! ```
//! use msftime::{waveform, CalendarRecord, EdgeEvent, MsfReceiverBuilder, Snapshot};
//!
//! let time = CalendarRecord {
//!     year_offset: 24,
//!     month: 6,
//!     day_of_month: 15,
//!     day_of_week: 6,
//!     hour: 14,
//!     minute: 30,
//!     dst: true,
//! };
//!
//! // one minute of signal, ended by the next minute marker
//! let mut edges = waveform::minute_edges(&waveform::encode_frame(&time));
//! edges.push(EdgeEvent::low(waveform::MARKER_MS));
//!
//! let mut rx = MsfReceiverBuilder::new().build();
//! let mut last = Snapshot::default();
//! rx.run(edges, &mut |snap: &Snapshot| last = *snap);
//! assert_eq!(last.to_string(), "Sat 15 Jun 2024 14:30:00 BST");
//! ```
//!
//! ## Background
//!
//! MSF transmits one bit pair, the "A" and "B" codes, in every
//! second. The length of the carrier-off pulse at the start of
//! each second encodes the pair, and a long 500 ms pulse marks
//! the start of each minute. The A codes carry the date and time
//! of the *next* minute in a weighted binary-coded decimal form.
//! The B codes carry odd parity for each field and a flag for
//! British Summer Time.
//!
//! There is no error correction. When a minute fails its parity
//! or signature checks, the receiver advances the last good
//! time by one minute instead.
//!
//! ## Crate features
//!
//! * `chrono`: Convert a [`CalendarRecord`] to and from
//!   `chrono::NaiveDateTime`. If enabled, `chrono` becomes part
//!   of this crate's public API.
//!

mod builder;
mod calendar;
mod decode;
mod edge;
mod frame;
mod receiver;
mod sync;

pub mod waveform;

pub use builder::MsfReceiverBuilder;
pub use calendar::{CalendarRecord, CENTURY};
pub use decode::{
    check_parity, check_signature, convert_bcd, decode_frame, Field, FieldValidation,
    FrameDecode, FrameDecodeErr, FrameDecodeErrs, MinuteDecodeErr, MinuteResult,
};
pub use edge::{
    classify, ClassifierOut, EdgeClass, EdgeClassifier, EdgeEvent, EdgeOutOfTolerance, EdgeTimer,
    Level,
};
pub use frame::{BitPair, FrameBuffer, SecondIndex, MINUTE_SECONDS};
pub use receiver::{
    DisplaySink, EventType, MsfReceiver, ReceiverEvent, Snapshot, SourceIter, TimeSource,
};
pub use sync::{SyncMachine, SyncState};
