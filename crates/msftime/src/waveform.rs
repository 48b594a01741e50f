//! MSF transmit-side encoding
//!
//! Builds the A and B code bits for a [`CalendarRecord`] and
//! the line [`EdgeEvent`]s that a receiver module would
//! produce for them. This is useful for testing and for
//! demonstrations.
//!
//! MSF announces each minute *in advance*: the bits sent
//! during one minute describe the minute which begins at the
//! next minute marker.

use crate::calendar::CalendarRecord;
use crate::decode::{Field, DST_IDX, SIGNATURE, SIGNATURE_START};
use crate::edge::EdgeEvent;
use crate::frame::{BitPair, FrameBuffer, SecondIndex, MINUTE_SECONDS};

/// Length of a second, in milliseconds
pub const SECOND_MS: u64 = 1000;

/// Carrier-off time for the minute marker, in milliseconds
pub const MARKER_MS: u64 = 500;

/// Encode one minute frame for `record`
///
/// Sets the date and time fields, the odd parity bits, the
/// summer time flag, and the `01111110` signature. All
/// other bits, such as DUT1, are zero.
pub fn encode_frame(record: &CalendarRecord) -> FrameBuffer {
    let mut a = [false; MINUTE_SECONDS];
    let mut b = [false; MINUTE_SECONDS];

    put_bcd(&mut a, 17, 8, record.year_offset);
    put_bcd(&mut a, 25, 5, record.month);
    put_bcd(&mut a, 30, 6, record.day_of_month);
    put_bcd(&mut a, 36, 3, record.day_of_week);
    put_bcd(&mut a, 39, 6, record.hour);
    put_bcd(&mut a, 45, 7, record.minute);

    for (i, &bit) in SIGNATURE.iter().enumerate() {
        a[SIGNATURE_START + i] = bit == 1;
    }

    for field in [Field::Year, Field::MonthDay, Field::Weekday, Field::HourMinute] {
        let ones = a[field.range()].iter().filter(|&&bit| bit).count();
        b[field.parity_idx()] = ones % 2 == 0;
    }

    b[DST_IDX] = record.dst;

    FrameBuffer::from_bits(&a, &b)
}

/// Line edges for one whole minute
///
/// Begins with the minute marker for second zero and ends
/// with the carrier-on period of second 59. The bits in
/// slot zero are not sent.
pub fn minute_edges(frame: &FrameBuffer) -> Vec<EdgeEvent> {
    let mut out = Vec::with_capacity(2 * MINUTE_SECONDS + 8);
    out.extend(marker_edges());
    for sec in 1..MINUTE_SECONDS {
        out.extend(second_edges(frame.get(SecondIndex::new(sec))));
    }
    out
}

/// Line edges for the minute marker second
pub fn marker_edges() -> [EdgeEvent; 2] {
    [
        EdgeEvent::low(MARKER_MS),
        EdgeEvent::high(SECOND_MS - MARKER_MS),
    ]
}

/// Line edges for one ordinary second carrying `bits`
pub fn second_edges(bits: BitPair) -> Vec<EdgeEvent> {
    match (bits.a, bits.b) {
        (false, false) => vec![EdgeEvent::low(100), EdgeEvent::high(900)],
        (true, false) => vec![EdgeEvent::low(200), EdgeEvent::high(800)],
        (true, true) => vec![EdgeEvent::low(300), EdgeEvent::high(700)],
        (false, true) => vec![
            EdgeEvent::low(100),
            EdgeEvent::high(100),
            EdgeEvent::low(100),
            EdgeEvent::high(700),
        ],
    }
}

// write `value` as right-aligned weighted bits
fn put_bcd(bits: &mut [bool], start: usize, length: usize, value: u8) {
    const WEIGHTS: [u8; 8] = [80, 40, 20, 10, 8, 4, 2, 1];

    let mut remain = value;
    for (i, &weight) in WEIGHTS[WEIGHTS.len() - length..].iter().enumerate() {
        if remain >= weight {
            bits[start + i] = true;
            remain -= weight;
        }
    }
}
