//! Scenario tests for the eligibility resolver.

use super::*;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::domain::{
    Cart, CartLine, ClockTime, DietaryCategory, HolidayWindow, ItemId, ItemStatus, MenuItem,
    Restaurant, RestaurantCode, RouteStop, RunningDays, StationCode, TimeWindow, TrainNumber,
    WeeklyOff,
};
use crate::pricing::PricingConfig;
use crate::store::MemoryStore;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn ist(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn stn(s: &str) -> StationCode {
    StationCode::parse(s).unwrap()
}

fn code(s: &str) -> RestaurantCode {
    RestaurantCode::new(s).unwrap()
}

fn make_route(
    number: u32,
    name: &str,
    days: &str,
    stops: &[(&str, &str, &str, u32)], // (station, arr, dep, day)
) -> Vec<RouteStop> {
    stops
        .iter()
        .enumerate()
        .map(|(i, (station, arr, dep, day))| RouteStop {
            train_number: TrainNumber(number),
            train_name: name.to_string(),
            station: stn(station),
            station_name: station.to_string(),
            sequence: i as u32 + 1,
            arrival: ClockTime::parse(arr).ok(),
            departure: ClockTime::parse(dep).ok(),
            running_days: RunningDays::parse(Some(days)),
            day_offset: *day,
        })
        .collect()
}

fn make_restaurant(c: &str, station: &str, hours: Option<(&str, &str)>, min: Option<i64>) -> Restaurant {
    Restaurant {
        code: code(c),
        station: stn(station),
        name: format!("Kitchen {c}"),
        is_active: true,
        hours: hours.and_then(|(open, close)| TimeWindow::parse(open, close)),
        min_order_value: min.map(Decimal::from),
        weekly_off: WeeklyOff::default(),
        cutoff_minutes: None,
    }
}

fn make_item(id: &str, restaurant: &str, price: i64, window: (&str, &str)) -> MenuItem {
    MenuItem {
        id: ItemId::new(id),
        restaurant: code(restaurant),
        name: id.to_string(),
        description: None,
        dietary: DietaryCategory::Veg,
        cuisine: None,
        menu_group: None,
        service_window: TimeWindow::parse(window.0, window.1),
        base_price: Decimal::from(price),
        gst_percent: Decimal::ZERO,
        selling_price: Decimal::from(price),
        status: ItemStatus::On,
    }
}

fn cart(items: &[(&str, i64)]) -> Cart {
    Cart::from_lines(items.iter().map(|(id, qty)| CartLine {
        item_id: ItemId::new(*id),
        quantity: *qty,
    }))
}

fn request(train: &str, station: &str, journey: &str, restaurant: &str, items: &[(&str, i64)]) -> EligibilityRequest {
    EligibilityRequest {
        train: train.to_string(),
        station: stn(station),
        journey_date: date(journey),
        boarding_station: None,
        restaurant: code(restaurant),
        cart: cart(items),
    }
}

/// Train 12345 runs daily BCT 06:00 → NDLS 14:30 → LKO 00:15 (day 2).
/// Train 12346 runs daily and reaches NDLS at 23:30.
/// R1 at NDLS: open 10:00-22:00, minimum order ₹200.
/// R2 at LKO: no recorded hours, no minimum.
fn builder() -> crate::store::MemoryStoreBuilder {
    MemoryStore::builder()
        .route(make_route(
            12345,
            "Test Express",
            "DAILY",
            &[
                ("BCT", "", "06:00", 1),
                ("NDLS", "14:30", "14:40", 1),
                ("LKO", "00:15", "00:25", 2),
            ],
        ))
        .route(make_route(
            12346,
            "Night Mail",
            "DAILY",
            &[("BCT", "", "15:00", 1), ("NDLS", "23:30", "23:40", 1)],
        ))
        .route(make_route(
            22221,
            "Weekly Special",
            "TUE,FRI",
            &[("BCT", "", "06:00", 1), ("NDLS", "14:30", "", 1)],
        ))
        .restaurant(make_restaurant("R1", "NDLS", Some(("10:00", "22:00")), Some(200)))
        .restaurant(make_restaurant("R2", "LKO", None, None))
        .menu_item(make_item("thali", "R1", 250, ("00:00", "23:59")))
        .menu_item(make_item("combo", "R1", 150, ("00:00", "23:59")))
        .menu_item(make_item("breakfast", "R1", 80, ("06:00", "10:00")))
        .menu_item(make_item("late", "R2", 120, ("22:00", "02:00")))
}

async fn resolve(
    store: &MemoryStore,
    req: &EligibilityRequest,
    now: &str,
) -> Result<Eligible, ResolveError> {
    resolve_with(store, req, now, &EligibilityConfig::default()).await
}

async fn resolve_with(
    store: &MemoryStore,
    req: &EligibilityRequest,
    now: &str,
    config: &EligibilityConfig,
) -> Result<Eligible, ResolveError> {
    let pricing = PricingConfig::default();
    Resolver::new(store, config, &pricing).resolve(req, at(now)).await
}

fn rejection(result: Result<Eligible, ResolveError>) -> Rejection {
    match result {
        Err(ResolveError::Rejected(r)) => r,
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_a_success() {
    let store = builder().build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    let ok = resolve(&store, &req, "2025-01-27 10:00").await.unwrap();

    assert_eq!(ok.train.number, TrainNumber(12345));
    assert_eq!(ok.stop.station, stn("NDLS"));
    assert_eq!(ok.arrival, at("2025-01-27 14:30"));
    assert_eq!(ok.restaurant.code, code("R1"));
    assert_eq!(ok.restaurant.cutoff_minutes, 90);
    assert_eq!(ok.bill.subtotal.to_string(), "250.00");
    assert_eq!(ok.bill.gst.to_string(), "12.50");
    assert_eq!(ok.lines.len(), 1);
}

#[tokio::test]
async fn scenario_b_min_order_not_met() {
    let store = builder().build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("combo", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);

    assert_eq!(r.code(), "min_order_not_met");
    assert_eq!(r.meta()["minOrder"], 200.0);
    assert_eq!(r.meta()["subtotal"], 150.0);
}

#[tokio::test]
async fn scenario_c_arrival_after_closing() {
    let store = builder().build();
    let req = request("12346", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);

    assert_eq!(r.code(), "restro_time_mismatch");
    assert_eq!(r.meta()["arrival"], "23:30");
    assert_eq!(r.meta()["open"], "10:00");
    assert_eq!(r.meta()["close"], "22:00");
}

#[tokio::test]
async fn scenario_d_overnight_item_after_midnight() {
    let store = builder().build();
    let mut req = request("12345", "LKO", "2025-01-27", "R2", &[("late", 2)]);
    req.boarding_station = Some(stn("BCT"));

    let ok = resolve(&store, &req, "2025-01-27 10:00").await.unwrap();

    // Day 2 stop, boarding on day 1
    assert_eq!(ok.arrival, at("2025-01-28 00:15"));
    assert_eq!(ok.stop.arrival_date, date("2025-01-28"));
    assert_eq!(ok.bill.subtotal.to_string(), "240.00");
}

#[tokio::test]
async fn scenario_e_unknown_train() {
    let store = builder().build();
    let req = request("99999", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);

    assert_eq!(r.code(), "train_not_found");
    assert_eq!(r.class(), RejectionClass::NotFound);
    // Exact lookup, then the partial fallback
    assert_eq!(store.route_lookup_count(), 2);
}

#[tokio::test]
async fn scenario_f_holiday_closed() {
    let store = builder()
        .holiday(HolidayWindow {
            restaurant: code("R1"),
            start_at: ist("2025-01-27T12:00:00+05:30"),
            end_at: ist("2025-01-27T18:00:00+05:30"),
            deleted_at: None,
        })
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);

    assert_eq!(r.code(), "holiday_closed");
    assert_eq!(r.meta()["until"], "2025-01-27T18:00:00+05:30");
}

#[tokio::test]
async fn holiday_window_compared_as_absolute_instant() {
    // 09:30 UTC is 15:00 IST, after the 14:30 arrival
    let store = builder()
        .holiday(HolidayWindow {
            restaurant: code("R1"),
            start_at: ist("2025-01-27T09:30:00Z"),
            end_at: ist("2025-01-27T12:00:00Z"),
            deleted_at: None,
        })
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    assert!(resolve(&store, &req, "2025-01-27 10:00").await.is_ok());
}

#[tokio::test]
async fn soft_deleted_holiday_does_not_block() {
    let store = builder()
        .holiday(HolidayWindow {
            restaurant: code("R1"),
            start_at: ist("2025-01-27T00:00:00+05:30"),
            end_at: ist("2025-01-28T00:00:00+05:30"),
            deleted_at: Some(ist("2025-01-20T00:00:00+05:30")),
        })
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    assert!(resolve(&store, &req, "2025-01-27 10:00").await.is_ok());
}

#[tokio::test]
async fn failing_holiday_lookup_fails_open() {
    let store = builder()
        .holiday(HolidayWindow {
            restaurant: code("R1"),
            start_at: ist("2025-01-27T00:00:00+05:30"),
            end_at: ist("2025-01-28T00:00:00+05:30"),
            deleted_at: None,
        })
        .fail_holidays_for(code("R1"))
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    assert!(resolve(&store, &req, "2025-01-27 10:00").await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn slow_holiday_lookup_fails_open() {
    let store = builder()
        .slow_holidays_for(code("R1"), Duration::from_secs(30))
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);
    let config = EligibilityConfig::default().with_lookup_timeout(2);

    assert!(resolve_with(&store, &req, "2025-01-27 10:00", &config).await.is_ok());
}

#[tokio::test]
async fn cutoff_exceeded() {
    let store = builder().build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    // Deadline is 13:00; exactly at the deadline is still allowed
    assert!(resolve(&store, &req, "2025-01-27 13:00").await.is_ok());

    let r = rejection(resolve(&store, &req, "2025-01-27 13:01").await);
    assert_eq!(r.code(), "cutoff_exceeded");
    assert_eq!(r.meta()["deadline"], "2025-01-27 13:00");
    assert_eq!(r.meta()["cutoffMinutes"], 90);
}

#[tokio::test]
async fn restaurant_cutoff_overrides_default() {
    let mut r1 = make_restaurant("R1", "NDLS", Some(("10:00", "22:00")), Some(200));
    r1.cutoff_minutes = Some(30);
    let store = MemoryStore::builder()
        .route(make_route(12345, "Test Express", "DAILY", &[("BCT", "", "06:00", 1), ("NDLS", "14:30", "", 1)]))
        .restaurant(r1)
        .menu_item(make_item("thali", "R1", 250, ("00:00", "23:59")))
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    assert!(resolve(&store, &req, "2025-01-27 13:30").await.is_ok());
    assert_eq!(
        rejection(resolve(&store, &req, "2025-01-27 14:01").await).code(),
        "cutoff_exceeded"
    );
}

#[tokio::test]
async fn weekly_off_uses_arrival_date() {
    let mut r2 = make_restaurant("R2", "LKO", None, None);
    // Boarding Monday, arriving Tuesday
    r2.weekly_off = WeeklyOff::parse(Some("TUE"));
    let store = MemoryStore::builder()
        .route(make_route(
            12345,
            "Test Express",
            "DAILY",
            &[("BCT", "", "06:00", 1), ("LKO", "00:15", "", 2)],
        ))
        .restaurant(r2)
        .menu_item(make_item("late", "R2", 120, ("22:00", "02:00")))
        .build();
    let mut req = request("12345", "LKO", "2025-01-27", "R2", &[("late", 1)]);
    req.boarding_station = Some(stn("BCT"));

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "weekly_off");
    assert_eq!(r.meta()["weekday"], "TUE");
}

#[tokio::test]
async fn station_not_on_route() {
    let store = builder().build();
    let req = request("12345", "HWH", "2025-01-27", "R1", &[("thali", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "station_not_on_route");
    assert_eq!(r.meta()["station"], "HWH");
}

#[tokio::test]
async fn strict_policy_rejects_non_running_day() {
    let store = builder().build();
    // 2025-01-27 is a Monday; train runs TUE,FRI
    let req = request("22221", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "not_running_on_date");
    assert_eq!(r.meta()["weekday"], "MON");
}

#[tokio::test]
async fn relaxed_policy_keeps_full_route() {
    let store = builder().build();
    let req = request("22221", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);
    let config = EligibilityConfig::default().with_running_day_policy(RunningDayPolicy::Relaxed);

    let ok = resolve_with(&store, &req, "2025-01-27 10:00", &config).await.unwrap();
    assert_eq!(ok.train.number, TrainNumber(22221));
}

#[tokio::test]
async fn fuzzy_name_lookup() {
    let store = builder().build();
    let req = request("night mail", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    // Resolves to 12346, which arrives after closing
    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "restro_time_mismatch");
}

#[tokio::test]
async fn empty_cart_checked_first() {
    let store = builder().build();
    let req = request("99999", "NDLS", "2025-01-27", "R1", &[("thali", 0)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "empty_cart");
    assert_eq!(r.class(), RejectionClass::InvalidInput);
}

#[tokio::test]
async fn stop_without_times_is_invalid_arrival() {
    let store = MemoryStore::builder()
        .route(make_route(
            12345,
            "Test Express",
            "DAILY",
            &[("BCT", "", "06:00", 1), ("NDLS", "--", "", 1)],
        ))
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "invalid_arrival_time");
}

#[tokio::test]
async fn restaurant_at_other_station_not_found() {
    let store = builder().build();
    let req = request("12345", "NDLS", "2025-01-27", "R2", &[("late", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "restaurant_not_found");
}

#[tokio::test]
async fn inactive_restaurant_not_found() {
    let mut r1 = make_restaurant("R1", "NDLS", Some(("10:00", "22:00")), None);
    r1.is_active = false;
    let store = MemoryStore::builder()
        .route(make_route(12345, "Test Express", "DAILY", &[("NDLS", "14:30", "", 1)]))
        .restaurant(r1)
        .build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]);

    assert_eq!(
        rejection(resolve(&store, &req, "2025-01-27 10:00").await).code(),
        "restaurant_not_found"
    );
}

#[tokio::test]
async fn unknown_item_unavailable() {
    let store = builder().build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1), ("late", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "item_unavailable");
    assert_eq!(r.meta()["items"][0], "late");
}

#[tokio::test]
async fn item_time_mismatch_lists_offenders() {
    let store = builder().build();
    let req = request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1), ("breakfast", 1)]);

    let r = rejection(resolve(&store, &req, "2025-01-27 10:00").await);
    assert_eq!(r.code(), "item_time_mismatch");
    let meta = r.meta();
    assert_eq!(meta["arrival"], "14:30");
    assert_eq!(meta["items"].as_array().unwrap().len(), 1);
    assert_eq!(meta["items"][0]["id"], "breakfast");
    assert_eq!(meta["items"][0]["start"], "06:00");
    assert_eq!(meta["items"][0]["end"], "10:00");
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let store = builder().build();
    let requests = [
        request("12345", "NDLS", "2025-01-27", "R1", &[("thali", 1)]),
        request("12345", "NDLS", "2025-01-27", "R1", &[("combo", 1)]),
        request("99999", "NDLS", "2025-01-27", "R1", &[("thali", 1)]),
    ];

    for req in &requests {
        let first = resolve(&store, req, "2025-01-27 10:00").await;
        let second = resolve(&store, req, "2025-01-27 10:00").await;
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(ResolveError::Rejected(a)), Err(ResolveError::Rejected(b))) => assert_eq!(a, b),
            other => panic!("outcomes differ: {other:?}"),
        }
    }
}

#[tokio::test]
async fn locate_stop_projects_from_boarding() {
    let store = builder().build();
    let config = EligibilityConfig::default();
    let pricing = PricingConfig::default();
    let resolver = Resolver::new(&store, &config, &pricing);

    let located = resolver
        .locate_stop("12345", &stn("LKO"), date("2025-01-31"), Some(&stn("NDLS")))
        .await
        .unwrap();
    assert_eq!(located.arrival, at("2025-02-01 00:15"));

    let located = resolver
        .locate_stop("12345", &stn("LKO"), date("2025-01-31"), None)
        .await
        .unwrap();
    assert_eq!(located.arrival, at("2025-01-31 00:15"));
}
