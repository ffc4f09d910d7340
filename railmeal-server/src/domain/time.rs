//! Time-of-day handling for timetables, restaurant hours and menu windows.
//!
//! Timetable and menu data carries times as "HH:MM" (sometimes "HH:MM:SS")
//! strings. Everything here degrades to `None` or `false` on bad input rather
//! than returning an error, so a malformed row can never panic a request; the
//! callers decide whether a missing time fails open or closed.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::fmt;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Error returned when parsing an invalid time or date string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A validated time of day, stored as minutes since midnight (0..=1439).
///
/// # Examples
///
/// ```
/// use railmeal_server::domain::ClockTime;
///
/// let t = ClockTime::parse("14:30").unwrap();
/// assert_eq!(t.minutes(), 870);
/// assert_eq!(t.to_string(), "14:30");
///
/// // Seconds are ignored
/// assert_eq!(ClockTime::parse("14:30:59").unwrap(), t);
///
/// assert!(ClockTime::parse("24:00").is_err());
/// assert!(ClockTime::parse("2:30").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Midnight.
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Build from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self((hour * 60 + minute) as u16))
    }

    /// Parse the first five characters of `s` as "HH:MM".
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let Some(head) = s.trim().get(..5) else {
            return Err(TimeError::new("expected HH:MM format"));
        };

        let bytes = head.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        Self::from_hm(hour, minute).ok_or_else(|| TimeError::new("time out of range"))
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u16 {
        self.0
    }

    /// Hour component (0-23).
    pub fn hour(&self) -> u32 {
        u32::from(self.0 / 60)
    }

    /// Minute component (0-59).
    pub fn minute(&self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Convert to a chrono time.
    pub fn to_naive_time(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or_default()
    }

    /// Twelve-hour display form, e.g. "2:30 PM" or "12:05 AM".
    pub fn to_12h(&self) -> String {
        let (hour, suffix) = match self.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute(), suffix)
    }
}

impl From<chrono::NaiveTime> for ClockTime {
    fn from(t: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl serde::Serialize for ClockTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ClockTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A time-of-day window between two clock times, both ends inclusive.
///
/// When `end` is earlier than `start` the window spans midnight
/// (e.g. 22:00-02:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TimeWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Parse both bounds; `None` if either fails.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: ClockTime::parse(start).ok()?,
            end: ClockTime::parse(end).ok()?,
        })
    }

    /// Whether the window wraps past midnight.
    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    /// Containment with overnight wraparound.
    pub fn contains(&self, t: ClockTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }

    /// Containment without wraparound: an inverted window contains nothing.
    ///
    /// Restaurant operating hours are read this way.
    pub fn contains_same_day(&self, t: ClockTime) -> bool {
        self.start <= t && t <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Minutes since midnight for an "HH:MM[:SS]" string, or `None` if invalid.
///
/// ```
/// use railmeal_server::domain::to_minutes;
///
/// assert_eq!(to_minutes("00:15"), Some(15));
/// assert_eq!(to_minutes("ab:cd"), None);
/// assert_eq!(to_minutes(""), None);
/// ```
pub fn to_minutes(hhmm: &str) -> Option<u16> {
    ClockTime::parse(hhmm).ok().map(|t| t.minutes())
}

/// String-level window check. Fails closed on any unparseable input.
///
/// ```
/// use railmeal_server::domain::in_window;
///
/// assert!(in_window("14:30", "10:00", "22:00"));
/// assert!(in_window("00:15", "22:00", "02:00"));
/// assert!(!in_window("12:00", "22:00", "02:00"));
/// assert!(!in_window("12:00", "bad", "22:00"));
/// ```
pub fn in_window(instant: &str, start: &str, end: &str) -> bool {
    let Ok(t) = ClockTime::parse(instant) else {
        return false;
    };
    TimeWindow::parse(start, end).is_some_and(|w| w.contains(t))
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| TimeError::new("expected YYYY-MM-DD"))
}

/// A fixed UTC offset from a number of minutes east of UTC. Out-of-range
/// values fall back to UTC.
pub fn fixed_offset(minutes_east: i32) -> FixedOffset {
    minutes_east
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
