//! Arrival-date projection along a multi-day route.
//!
//! Timetables give each stop a day offset relative to the train's origin
//! (day 1, day 2, ...). Passengers give the date they board. The date a
//! stop is reached is the boarding date shifted by the difference in
//! offsets.

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::{ClockTime, RouteStop, StationCode};

/// Calendar date on which a stop is reached.
///
/// When the boarding stop's offset is unknown the journey date is returned
/// unchanged.
///
/// ```
/// use chrono::NaiveDate;
/// use railmeal_server::eligibility::project_arrival_date;
///
/// let boarding = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
/// assert_eq!(
///     project_arrival_date(boarding, Some(1), 3),
///     NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
/// );
/// assert_eq!(project_arrival_date(boarding, None, 3), boarding);
/// ```
pub fn project_arrival_date(
    journey_date: NaiveDate,
    boarding_offset: Option<u32>,
    target_offset: u32,
) -> NaiveDate {
    let Some(boarding_offset) = boarding_offset else {
        return journey_date;
    };

    let shifted = if target_offset >= boarding_offset {
        journey_date.checked_add_days(Days::new(u64::from(target_offset - boarding_offset)))
    } else {
        journey_date.checked_sub_days(Days::new(u64::from(boarding_offset - target_offset)))
    };

    // Only out-of-range dates (year ±262143) fail to shift
    shifted.unwrap_or(journey_date)
}

/// A stop with its projected arrival date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedStop {
    pub station: StationCode,
    pub station_name: String,
    pub sequence: u32,
    pub day_offset: u32,
    pub arrival: Option<ClockTime>,
    pub departure: Option<ClockTime>,
    pub arrival_date: NaiveDate,
}

impl ProjectedStop {
    pub fn new(stop: &RouteStop, arrival_date: NaiveDate) -> Self {
        Self {
            station: stop.station,
            station_name: stop.station_name.clone(),
            sequence: stop.sequence,
            day_offset: stop.day_offset,
            arrival: stop.arrival,
            departure: stop.departure,
            arrival_date,
        }
    }

    /// Local instant at which the train is at this stop. `None` when the
    /// timetable has neither an arrival nor a departure time.
    pub fn arrival_at(&self) -> Option<NaiveDateTime> {
        let time = self.arrival.or(self.departure)?;
        Some(self.arrival_date.and_time(time.to_naive_time()))
    }
}

/// The day offset of the boarding stop, if it is on the route.
pub fn boarding_offset(stops: &[RouteStop], boarding: Option<&StationCode>) -> Option<u32> {
    let boarding = boarding?;
    stops
        .iter()
        .find(|s| &s.station == boarding)
        .map(|s| s.day_offset)
}

/// Project every stop of a route from a journey date.
pub fn project_route(
    stops: &[RouteStop],
    journey_date: NaiveDate,
    boarding: Option<&StationCode>,
) -> Vec<ProjectedStop> {
    let offset = boarding_offset(stops, boarding);
    stops
        .iter()
        .map(|s| ProjectedStop::new(s, project_arrival_date(journey_date, offset, s.day_offset)))
        .collect()
}
