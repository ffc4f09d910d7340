//! Restaurants (station outlets) and their scheduled closures.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::running_days::WeeklyOff;
use super::station::StationCode;
use super::time::TimeWindow;

/// Identifier of a restaurant outlet.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantCode(String);

impl RestaurantCode {
    /// Create a code from any non-blank string. Surrounding whitespace is
    /// dropped.
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim();
        (!code.is_empty()).then(|| Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RestaurantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestaurantCode({})", self.0)
    }
}

impl fmt::Display for RestaurantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vendor outlet bound to one station.
///
/// Built only through the store's normalization layer, so every field is
/// already in its strict form: flags are booleans, amounts are positive or
/// absent, unparseable hours are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restaurant {
    pub code: RestaurantCode,
    pub station: StationCode,
    pub name: String,
    pub is_active: bool,
    /// Same-day operating window; `None` when either bound is missing or
    /// unparseable, in which case hours are not checked.
    pub hours: Option<TimeWindow>,
    /// Minimum cart subtotal, always positive when present.
    pub min_order_value: Option<Decimal>,
    pub weekly_off: WeeklyOff,
    /// Minutes before arrival after which new orders are refused.
    pub cutoff_minutes: Option<u32>,
}

impl Restaurant {
    /// The cut-off to apply, falling back to `default_minutes`.
    pub fn effective_cutoff(&self, default_minutes: u32) -> u32 {
        self.cutoff_minutes.unwrap_or(default_minutes)
    }
}

/// A scheduled closure for one restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayWindow {
    pub restaurant: RestaurantCode,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    /// Soft-delete marker. A deleted window never blocks anything.
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl HolidayWindow {
    /// Whether the window is live (not soft-deleted).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whether this window blocks orders at `instant`. Bounds are inclusive.
    pub fn covers(&self, instant: DateTime<FixedOffset>) -> bool {
        self.is_active() && self.start_at <= instant && instant <= self.end_at
    }
}

/// The first active window covering `instant`, if any.
pub fn blocking_holiday(
    windows: &[HolidayWindow],
    instant: DateTime<FixedOffset>,
) -> Option<&HolidayWindow> {
    windows.iter().find(|w| w.covers(instant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn window(start: &str, end: &str, deleted: Option<&str>) -> HolidayWindow {
        HolidayWindow {
            restaurant: RestaurantCode::new("R1").unwrap(),
            start_at: ts(start),
            end_at: ts(end),
            deleted_at: deleted.map(ts),
        }
    }

    #[test]
    fn restaurant_code_rejects_blank() {
        assert!(RestaurantCode::new("").is_none());
        assert!(RestaurantCode::new("  ").is_none());
        assert_eq!(RestaurantCode::new(" R42 ").unwrap().as_str(), "R42");
    }

    #[test]
    fn covers_is_inclusive() {
        let w = window("2025-01-01T10:00:00+05:30", "2025-01-01T18:00:00+05:30", None);
        assert!(w.covers(ts("2025-01-01T10:00:00+05:30")));
        assert!(w.covers(ts("2025-01-01T18:00:00+05:30")));
        assert!(!w.covers(ts("2025-01-01T18:00:01+05:30")));
    }

    #[test]
    fn covers_compares_absolute_instants() {
        let w = window("2025-01-01T10:00:00+05:30", "2025-01-01T18:00:00+05:30", None);
        // 05:00 UTC is 10:30 IST
        assert!(w.covers(ts("2025-01-01T05:00:00Z")));
        // 13:00 UTC is 18:30 IST
        assert!(!w.covers(ts("2025-01-01T13:00:00Z")));
    }

    #[test]
    fn deleted_windows_are_inert() {
        let w = window(
            "2025-01-01T00:00:00+05:30",
            "2025-01-31T00:00:00+05:30",
            Some("2024-12-31T09:00:00+05:30"),
        );
        assert!(!w.is_active());
        assert!(!w.covers(ts("2025-01-10T12:00:00+05:30")));
        assert!(blocking_holiday(&[w], ts("2025-01-10T12:00:00+05:30")).is_none());
    }

    #[test]
    fn blocking_holiday_finds_first_active() {
        let windows = vec![
            window(
                "2025-01-01T00:00:00+05:30",
                "2025-01-31T00:00:00+05:30",
                Some("2024-12-31T09:00:00+05:30"),
            ),
            window("2025-01-09T00:00:00+05:30", "2025-01-11T00:00:00+05:30", None),
        ];
        let hit = blocking_holiday(&windows, ts("2025-01-10T12:00:00+05:30")).unwrap();
        assert!(hit.is_active());
    }
}
