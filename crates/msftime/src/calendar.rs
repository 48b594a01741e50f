//! Decoded calendar date and time-of-day

use std::fmt;

#[cfg(feature = "chrono")]
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTHS: [&str; 13] = [
    "-", "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// MSF years are two-digit offsets from this year
pub const CENTURY: u16 = 2000;

/// Calendar date and time-of-day carried by one MSF minute
///
/// MSF transmits UK civil time: GMT in winter and BST in
/// summer. The `dst` flag is set when BST is in effect.
///
/// Values are stored as decoded and are not range-checked.
/// A corrupted (but parity-valid) field may hold an
/// impossible value, such as month 14.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CalendarRecord {
    /// Year, offset from 2000 (`0..=99`)
    pub year_offset: u8,

    /// Month of year (`1..=12`)
    pub month: u8,

    /// Day of month (`1..=31`)
    pub day_of_month: u8,

    /// Day of week (`0` = Sunday … `6` = Saturday)
    pub day_of_week: u8,

    /// Hour of day (`0..=23`)
    pub hour: u8,

    /// Minute of hour (`0..=59`)
    pub minute: u8,

    /// British Summer Time is in effect
    pub dst: bool,
}

impl CalendarRecord {
    /// Four-digit year
    pub fn year(&self) -> u16 {
        CENTURY + self.year_offset as u16
    }

    /// Short weekday name, like `Wed`, or `---` if invalid
    pub fn weekday_str(&self) -> &'static str {
        WEEKDAYS
            .get(self.day_of_week as usize)
            .copied()
            .unwrap_or("---")
    }

    /// Short month name, like `Jun`, or `-` if invalid
    pub fn month_str(&self) -> &'static str {
        MONTHS.get(self.month as usize).copied().unwrap_or(MONTHS[0])
    }

    /// Timezone abbreviation: `GMT` or `BST`
    pub fn timezone_str(&self) -> &'static str {
        if self.dst {
            "BST"
        } else {
            "GMT"
        }
    }

    /// Advance by one minute
    ///
    /// Minute 59 carries into the hour, and hour 23 wraps to
    /// zero. The date fields are left alone.
    pub fn advance_minute(&mut self) {
        self.minute = self.minute.saturating_add(1);
        if self.minute >= 60 {
            self.minute = 0;
            self.hour = self.hour.saturating_add(1);
            if self.hour >= 24 {
                self.hour = 0;
            }
        }
    }

    /// Date as text, like `Wed 15 Jun 2024`
    pub fn date_string(&self) -> String {
        format!(
            "{} {:02} {} {:04}",
            self.weekday_str(),
            self.day_of_month,
            self.month_str(),
            self.year()
        )
    }

    /// Convert to a `chrono` date and time
    ///
    /// Returns `None` if the fields do not form a valid date
    /// or time. The weekday and DST flag are not checked.
    #[cfg(feature = "chrono")]
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            self.year() as i32,
            self.month as u32,
            self.day_of_month as u32,
        )?
        .and_hms_opt(self.hour as u32, self.minute as u32, 0)
    }

    /// Build from a `chrono` date and time in UK civil time
    ///
    /// Seconds are discarded. Returns `None` if the year is
    /// outside 2000–2099.
    #[cfg(feature = "chrono")]
    pub fn from_naive_datetime(dt: &NaiveDateTime, dst: bool) -> Option<Self> {
        let year_offset = u8::try_from(dt.year().checked_sub(CENTURY as i32)?).ok()?;
        if year_offset > 99 {
            return None;
        }

        Some(Self {
            year_offset,
            month: dt.month() as u8,
            day_of_month: dt.day() as u8,
            day_of_week: dt.weekday().num_days_from_sunday() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            dst,
        })
    }
}

impl fmt::Display for CalendarRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02} {}",
            self.date_string(),
            self.hour,
            self.minute,
            self.timezone_str()
        )
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
    fn test_names() {
        let rec = record();
        assert_eq!(rec.year(), 2024);
        assert_eq!(rec.weekday_str(), "Wed");
        assert_eq!(rec.month_str(), "Jun");
        assert_eq!(rec.timezone_str(), "BST");
        assert_eq!(rec.date_string(), "Wed 15 Jun 2024");
        assert_eq!(format!("{}", rec), "Wed 15 Jun 2024 14:30 BST");

        let bad = CalendarRecord {
            month: 14,
            day_of_week: 7,
            ..CalendarRecord::default()
        };
        assert_eq!(bad.month_str(), "-");
        assert_eq!(bad.weekday_str(), "---");
        assert_eq!(CalendarRecord::default().month_str(), "-");
        assert_eq!(CalendarRecord::default().timezone_str(), "GMT");
    }

    #[test]
    fn test_advance_minute() {
        let mut rec = record();
        rec.advance_minute();
        assert_eq!((rec.hour, rec.minute), (14, 31));

        rec.minute = 59;
        rec.advance_minute();
        assert_eq!((rec.hour, rec.minute), (15, 0));

        rec.hour = 23;
        rec.minute = 59;
        rec.advance_minute();
        assert_eq!((rec.hour, rec.minute), (0, 0));

        // date is untouched
        assert_eq!(rec.day_of_month, 15);
        assert_eq!(rec.day_of_week, 3);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_chrono() {
        let dt = record().to_naive_datetime().expect("valid date");
        assert_eq!(dt.to_string(), "2024-06-15 14:30:00");

        let rec = CalendarRecord::from_naive_datetime(&dt, true).expect("in range");
        assert_eq!(rec.year_offset, 24);
        assert_eq!(rec.day_of_week, 6); // really a Saturday
        assert_eq!((rec.hour, rec.minute), (14, 30));

        let bad = CalendarRecord {
            month: 2,
            day_of_month: 30,
            ..record()
        };
        assert_eq!(bad.to_naive_datetime(), None);

        let old = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(CalendarRecord::from_naive_datetime(&old, false), None);
    }
}
