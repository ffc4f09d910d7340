//! Restaurant availability at a station for an arrival instant.
//!
//! Restaurants are dropped when inactive, when the arrival falls outside
//! their same-day opening hours, on their weekly off day, or when an active
//! holiday window covers the arrival instant.
//!
//! Holiday windows are fetched per restaurant, in chunks issued
//! concurrently. A lookup that fails or times out counts as "no holiday" so
//! a store glitch never hides an otherwise open restaurant.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{ClockTime, HolidayWindow, Restaurant, RestaurantCode, StationCode, blocking_holiday};
use crate::store::{DataStore, StoreError};

use super::config::EligibilityConfig;

/// Why a restaurant is not offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Inactive,
    OutsideHours,
    WeeklyOff,
    Holiday(HolidayWindow),
}

/// A restaurant that can take orders for the arrival, with the values later
/// checks need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableRestaurant {
    pub code: RestaurantCode,
    pub name: String,
    pub station: StationCode,
    pub open: Option<ClockTime>,
    pub close: Option<ClockTime>,
    pub min_order_value: Option<Decimal>,
    pub cutoff_minutes: u32,
}

impl AvailableRestaurant {
    pub fn new(restaurant: &Restaurant, default_cutoff: u32) -> Self {
        Self {
            code: restaurant.code.clone(),
            name: restaurant.name.clone(),
            station: restaurant.station,
            open: restaurant.hours.map(|h| h.start),
            close: restaurant.hours.map(|h| h.end),
            min_order_value: restaurant.min_order_value,
            cutoff_minutes: restaurant.effective_cutoff(default_cutoff),
        }
    }
}

/// Local timetable time as an absolute instant.
pub fn to_instant(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.from_local_datetime(&local).single()
}

/// The checks that need no store access: active flag, hours, weekly off.
pub fn static_exclusion(restaurant: &Restaurant, arrival: NaiveDateTime) -> Option<Exclusion> {
    if !restaurant.is_active {
        return Some(Exclusion::Inactive);
    }

    // Restaurant hours never wrap midnight
    if let Some(hours) = restaurant.hours {
        if !hours.contains_same_day(ClockTime::from(arrival.time())) {
            return Some(Exclusion::OutsideHours);
        }
    }

    if restaurant.weekly_off.is_off(arrival.date()) {
        return Some(Exclusion::WeeklyOff);
    }

    None
}

/// The holiday window blocking a restaurant at `instant`, if any.
///
/// Fails open: a store error or a timeout is logged and treated as no
/// holiday.
pub async fn holiday_block<S: DataStore>(
    store: &S,
    code: &RestaurantCode,
    instant: DateTime<FixedOffset>,
    config: &EligibilityConfig,
) -> Option<HolidayWindow> {
    let lookup = tokio::time::timeout(config.lookup_timeout(), store.active_holidays(code));

    let windows = match lookup.await {
        Ok(Ok(windows)) => windows,
        Ok(Err(e)) => {
            warn!(restaurant = %code, error = %e, "holiday lookup failed, assuming open");
            return None;
        }
        Err(_) => {
            warn!(
                restaurant = %code,
                timeout_secs = config.lookup_timeout_secs,
                "holiday lookup timed out, assuming open"
            );
            return None;
        }
    };

    blocking_holiday(&windows, instant).cloned()
}

/// Holiday blocks for many restaurants, in input order.
///
/// Lookups are issued `holiday_chunk_size` at a time; each chunk runs
/// concurrently and is awaited before the next starts.
pub async fn holiday_blocks<S: DataStore>(
    store: &S,
    codes: &[RestaurantCode],
    instant: DateTime<FixedOffset>,
    config: &EligibilityConfig,
) -> Vec<Option<HolidayWindow>> {
    let mut blocks = Vec::with_capacity(codes.len());

    for chunk in codes.chunks(config.holiday_chunk_size.max(1)) {
        let futures: Vec<_> = chunk
            .iter()
            .map(|code| holiday_block(store, code, instant, config))
            .collect();

        // join_all preserves input order
        blocks.extend(join_all(futures).await);
    }

    blocks
}

/// Restaurants at `station` that can serve a train arriving at `arrival`
/// (local time).
pub async fn available_restaurants<S: DataStore>(
    store: &S,
    station: &StationCode,
    arrival: NaiveDateTime,
    config: &EligibilityConfig,
) -> Result<Vec<AvailableRestaurant>, StoreError> {
    let restaurants = store.restaurants_at(station).await?;
    let total = restaurants.len();

    let candidates: Vec<Restaurant> = restaurants
        .into_iter()
        .filter(|r| match static_exclusion(r, arrival) {
            Some(reason) => {
                debug!(restaurant = %r.code, ?reason, "restaurant excluded");
                false
            }
            None => true,
        })
        .collect();

    let blocks = match to_instant(arrival, config.local_offset()) {
        Some(instant) => {
            let codes: Vec<RestaurantCode> = candidates.iter().map(|r| r.code.clone()).collect();
            holiday_blocks(store, &codes, instant, config).await
        }
        None => {
            warn!(%arrival, "arrival instant out of range, skipping holiday checks");
            vec![None; candidates.len()]
        }
    };

    let available: Vec<AvailableRestaurant> = candidates
        .iter()
        .zip(blocks)
        .filter_map(|(r, block)| match block {
            Some(window) => {
                let reason = Exclusion::Holiday(window);
                debug!(restaurant = %r.code, ?reason, "restaurant excluded");
                None
            }
            None => Some(AvailableRestaurant::new(r, config.default_cutoff_minutes)),
        })
        .collect();

    debug!(
        station = %station,
        total,
        available = available.len(),
        "restaurant availability"
    );

    Ok(available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::{TimeWindow, WeeklyOff};
    use crate::store::MemoryStore;

    fn station() -> StationCode {
        StationCode::parse("NDLS").unwrap()
    }

    fn code(s: &str) -> RestaurantCode {
        RestaurantCode::new(s).unwrap()
    }

    fn restaurant(c: &str) -> Restaurant {
        Restaurant {
            code: code(c),
            station: station(),
            name: format!("Restaurant {c}"),
            is_active: true,
            hours: TimeWindow::parse("10:00", "22:00"),
            min_order_value: None,
            weekly_off: WeeklyOff::default(),
            cutoff_minutes: None,
        }
    }

    fn arrival(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn ist(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn holiday(c: &str, start: &str, end: &str, deleted: bool) -> HolidayWindow {
        HolidayWindow {
            restaurant: code(c),
            start_at: ist(start),
            end_at: ist(end),
            deleted_at: deleted.then(|| ist("2025-01-01T00:00:00+05:30")),
        }
    }

    fn codes(list: &[AvailableRestaurant]) -> Vec<&str> {
        list.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn static_checks() {
        let mut r = restaurant("R1");
        assert_eq!(static_exclusion(&r, arrival("2025-01-27 14:30")), None);
        assert_eq!(
            static_exclusion(&r, arrival("2025-01-27 23:30")),
            Some(Exclusion::OutsideHours)
        );

        r.weekly_off = WeeklyOff::parse(Some("MON"));
        assert_eq!(
            static_exclusion(&r, arrival("2025-01-27 14:30")),
            Some(Exclusion::WeeklyOff)
        );

        r.is_active = false;
        assert_eq!(
            static_exclusion(&r, arrival("2025-01-27 14:30")),
            Some(Exclusion::Inactive)
        );
    }

    #[test]
    fn inverted_hours_match_nothing() {
        let mut r = restaurant("R1");
        r.hours = TimeWindow::parse("22:00", "02:00");
        assert_eq!(
            static_exclusion(&r, arrival("2025-01-27 23:00")),
            Some(Exclusion::OutsideHours)
        );
    }

    #[test]
    fn missing_hours_are_not_checked() {
        let mut r = restaurant("R1");
        r.hours = None;
        assert_eq!(static_exclusion(&r, arrival("2025-01-27 03:00")), None);
    }

    #[tokio::test]
    async fn holiday_excludes_regardless_of_hours() {
        let store = MemoryStore::builder()
            .restaurant(restaurant("R1"))
            .restaurant(restaurant("R2"))
            .holiday(holiday(
                "R1",
                "2025-01-27T00:00:00+05:30",
                "2025-01-27T23:59:59+05:30",
                false,
            ))
            .build();

        let list = available_restaurants(
            &store,
            &station(),
            arrival("2025-01-27 14:30"),
            &EligibilityConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(codes(&list), ["R2"]);
    }

    #[tokio::test]
    async fn deleted_holiday_is_ignored() {
        let store = MemoryStore::builder()
            .restaurant(restaurant("R1"))
            .holiday(holiday(
                "R1",
                "2025-01-27T00:00:00+05:30",
                "2025-01-27T23:59:59+05:30",
                true,
            ))
            .build();

        let list = available_restaurants(
            &store,
            &station(),
            arrival("2025-01-27 14:30"),
            &EligibilityConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(codes(&list), ["R1"]);
    }

    #[tokio::test]
    async fn failed_holiday_lookup_fails_open() {
        let store = MemoryStore::builder()
            .restaurant(restaurant("R1"))
            .restaurant(restaurant("R2"))
            .holiday(holiday(
                "R1",
                "2025-01-27T00:00:00+05:30",
                "2025-01-27T23:59:59+05:30",
                false,
            ))
            .fail_holidays_for(code("R1"))
            .build();

        let list = available_restaurants(
            &store,
            &station(),
            arrival("2025-01-27 14:30"),
            &EligibilityConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(codes(&list), ["R1", "R2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_holiday_lookup_fails_open() {
        let store = MemoryStore::builder()
            .restaurant(restaurant("R1"))
            .holiday(holiday(
                "R1",
                "2025-01-27T00:00:00+05:30",
                "2025-01-27T23:59:59+05:30",
                false,
            ))
            .slow_holidays_for(code("R1"), Duration::from_secs(60))
            .build();

        let config = EligibilityConfig::default().with_lookup_timeout(1);
        let list = available_restaurants(&store, &station(), arrival("2025-01-27 14:30"), &config)
            .await
            .unwrap();
        assert_eq!(codes(&list), ["R1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn holiday_lookups_are_chunked_and_ordered() {
        let mut builder = MemoryStore::builder().holiday_delay(Duration::from_millis(50));
        for i in 0..14 {
            builder = builder.restaurant(restaurant(&format!("R{i:02}")));
        }
        // Every third restaurant is closed
        for i in (0..14).step_by(3) {
            builder = builder.holiday(holiday(
                &format!("R{i:02}"),
                "2025-01-27T00:00:00+05:30",
                "2025-01-27T23:59:59+05:30",
                false,
            ));
        }
        let store = builder.build();

        let list = available_restaurants(
            &store,
            &station(),
            arrival("2025-01-27 14:30"),
            &EligibilityConfig::default(),
        )
        .await
        .unwrap();

        let expected: Vec<String> = (0..14)
            .filter(|i| i % 3 != 0)
            .map(|i| format!("R{i:02}"))
            .collect();
        assert_eq!(codes(&list), expected);
        assert_eq!(store.max_concurrent_holiday_lookups(), 6);
    }

    #[tokio::test]
    async fn annotates_min_order_and_cutoff() {
        let mut r = restaurant("R1");
        r.min_order_value = Some(Decimal::from(200));
        let mut r2 = restaurant("R2");
        r2.cutoff_minutes = Some(45);
        let store = MemoryStore::builder().restaurant(r).restaurant(r2).build();

        let list = available_restaurants(
            &store,
            &station(),
            arrival("2025-01-27 14:30"),
            &EligibilityConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(list[0].min_order_value, Some(Decimal::from(200)));
        assert_eq!(list[0].cutoff_minutes, 90);
        assert_eq!(list[1].cutoff_minutes, 45);
    }
}
