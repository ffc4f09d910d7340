//! Trains and their timetabled stops.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::running_days::RunningDays;
use super::station::StationCode;
use super::time::ClockTime;

/// A numeric train number, e.g. 12951.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainNumber(pub u32);

impl fmt::Debug for TrainNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainNumber({})", self.0)
    }
}

impl fmt::Display for TrainNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the passenger typed to find their train.
///
/// ```
/// use railmeal_server::domain::{TrainIdentifier, TrainNumber};
///
/// assert_eq!(
///     TrainIdentifier::parse("12951"),
///     Some(TrainIdentifier::Number(TrainNumber(12951)))
/// );
/// assert_eq!(
///     TrainIdentifier::parse("  rajdhani "),
///     Some(TrainIdentifier::Text("rajdhani".to_string()))
/// );
/// assert_eq!(TrainIdentifier::parse("   "), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainIdentifier {
    /// All digits.
    Number(TrainNumber),
    /// A fragment of the train name (or of a number too long to be one).
    Text(String),
}

impl TrainIdentifier {
    /// Classify a raw identifier. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<u32>() {
                return Some(TrainIdentifier::Number(TrainNumber(n)));
            }
        }

        Some(TrainIdentifier::Text(raw.to_string()))
    }

    /// The text used for the fuzzy fallback query.
    pub fn search_text(&self) -> String {
        match self {
            TrainIdentifier::Number(n) => n.to_string(),
            TrainIdentifier::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for TrainIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.search_text())
    }
}

/// One station on a train's itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStop {
    pub train_number: TrainNumber,
    pub train_name: String,
    pub station: StationCode,
    pub station_name: String,
    /// Ordinal position along the route.
    pub sequence: u32,
    /// `None` at the origin, or when the timetable has no usable time.
    pub arrival: Option<ClockTime>,
    /// `None` at the terminus.
    pub departure: Option<ClockTime>,
    pub running_days: RunningDays,
    /// Day of the journey (1-based) on which this stop is reached.
    pub day_offset: u32,
}
