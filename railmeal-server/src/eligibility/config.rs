//! Eligibility configuration.

use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;

use crate::domain::fixed_offset;

/// What to do when no stop of a train runs on the requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningDayPolicy {
    /// Reject with `not_running_on_date`.
    #[default]
    Strict,
    /// Ignore the schedule and keep the full route.
    Relaxed,
}

impl FromStr for RunningDayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(RunningDayPolicy::Strict),
            "relaxed" => Ok(RunningDayPolicy::Relaxed),
            other => Err(format!("unknown running-day policy: {other}")),
        }
    }
}

/// Configuration parameters for eligibility checks.
#[derive(Debug, Clone)]
pub struct EligibilityConfig {
    /// Cut-off applied when a restaurant has none of its own (minutes).
    pub default_cutoff_minutes: u32,

    /// Number of holiday lookups issued concurrently.
    pub holiday_chunk_size: usize,

    /// Deadline for a single auxiliary lookup (seconds).
    /// A lookup that misses it is treated as failed.
    pub lookup_timeout_secs: u64,

    /// Running-day strictness, applied by every call site.
    pub running_day_policy: RunningDayPolicy,

    /// Offset of the timetable's local time from UTC (minutes).
    pub utc_offset_minutes: i32,
}

impl EligibilityConfig {
    /// Returns the lookup timeout as a Duration.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Returns the timetable's UTC offset.
    pub fn local_offset(&self) -> FixedOffset {
        fixed_offset(self.utc_offset_minutes)
    }

    pub fn with_default_cutoff(mut self, minutes: u32) -> Self {
        self.default_cutoff_minutes = minutes;
        self
    }

    pub fn with_holiday_chunk_size(mut self, n: usize) -> Self {
        self.holiday_chunk_size = n.max(1);
        self
    }

    pub fn with_lookup_timeout(mut self, secs: u64) -> Self {
        self.lookup_timeout_secs = secs;
        self
    }

    pub fn with_running_day_policy(mut self, policy: RunningDayPolicy) -> Self {
        self.running_day_policy = policy;
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            default_cutoff_minutes: 90,
            holiday_chunk_size: 6,
            lookup_timeout_secs: 8,
            running_day_policy: RunningDayPolicy::Strict,
            utc_offset_minutes: 330, // IST
        }
    }
}
