//! Eligibility outcomes.
//!
//! A rejection is a business result, not a failure of the service: each
//! carries a stable machine code and the context a client needs to explain
//! it (arrival time, opening hours, offending items, amounts).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::{ClockTime, ItemId, RestaurantCode, StationCode, TimeWindow, TrainNumber};
use crate::pricing::{Bill, PricedLine, format_amount};

use super::projector::ProjectedStop;
use super::restaurants::AvailableRestaurant;
use super::route::TrainSummary;

/// How a rejection maps onto the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionClass {
    /// The request itself is malformed or incomplete.
    InvalidInput,
    /// A referenced train, stop or restaurant does not exist.
    NotFound,
    /// Everything exists but a business rule forbids the order.
    BusinessRule,
}

/// A cart item whose service window does not cover the arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffendingItem {
    pub id: ItemId,
    pub name: String,
    /// `None` when the stored window did not parse.
    pub window: Option<TimeWindow>,
}

/// Why an order cannot be placed. Variants are listed in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyCart,
    TrainNotFound {
        train: String,
    },
    StationNotOnRoute {
        train: TrainNumber,
        station: StationCode,
    },
    NotRunningOnDate {
        train: TrainNumber,
        date: NaiveDate,
    },
    InvalidArrivalTime {
        station: StationCode,
    },
    RestaurantNotFound {
        restaurant: RestaurantCode,
        station: StationCode,
    },
    WeeklyOff {
        date: NaiveDate,
        weekday: &'static str,
    },
    HolidayClosed {
        arrival: NaiveDateTime,
        until: DateTime<FixedOffset>,
    },
    CutoffExceeded {
        arrival: NaiveDateTime,
        cutoff_minutes: u32,
        /// `None` when the deadline could not be computed.
        deadline: Option<NaiveDateTime>,
    },
    RestroTimeMismatch {
        arrival: ClockTime,
        hours: TimeWindow,
    },
    ItemUnavailable {
        items: Vec<ItemId>,
    },
    ItemTimeMismatch {
        arrival: ClockTime,
        items: Vec<OffendingItem>,
    },
    MinOrderNotMet {
        min_order: Decimal,
        subtotal: Decimal,
    },
}

fn amount(d: Decimal) -> Value {
    d.to_f64().map_or(Value::Null, Value::from)
}

fn local(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::EmptyCart => "empty_cart",
            Rejection::TrainNotFound { .. } => "train_not_found",
            Rejection::StationNotOnRoute { .. } => "station_not_on_route",
            Rejection::NotRunningOnDate { .. } => "not_running_on_date",
            Rejection::InvalidArrivalTime { .. } => "invalid_arrival_time",
            Rejection::RestaurantNotFound { .. } => "restaurant_not_found",
            Rejection::WeeklyOff { .. } => "weekly_off",
            Rejection::HolidayClosed { .. } => "holiday_closed",
            Rejection::CutoffExceeded { .. } => "cutoff_exceeded",
            Rejection::RestroTimeMismatch { .. } => "restro_time_mismatch",
            Rejection::ItemUnavailable { .. } => "item_unavailable",
            Rejection::ItemTimeMismatch { .. } => "item_time_mismatch",
            Rejection::MinOrderNotMet { .. } => "min_order_not_met",
        }
    }

    pub fn class(&self) -> RejectionClass {
        match self {
            Rejection::EmptyCart | Rejection::InvalidArrivalTime { .. } => {
                RejectionClass::InvalidInput
            }
            Rejection::TrainNotFound { .. }
            | Rejection::StationNotOnRoute { .. }
            | Rejection::RestaurantNotFound { .. } => RejectionClass::NotFound,
            _ => RejectionClass::BusinessRule,
        }
    }

    /// Human-readable explanation.
    pub fn message(&self) -> String {
        match self {
            Rejection::EmptyCart => "Your cart is empty.".to_string(),
            Rejection::TrainNotFound { train } => format!("No train found for \"{train}\"."),
            Rejection::StationNotOnRoute { train, station } => {
                format!("Train {train} does not stop at {station}.")
            }
            Rejection::NotRunningOnDate { train, date } => {
                format!("Train {train} does not run on {}.", date.format("%d %b %Y"))
            }
            Rejection::InvalidArrivalTime { station } => {
                format!("No scheduled time is available for {station}.")
            }
            Rejection::RestaurantNotFound { restaurant, station } => {
                format!("Restaurant {restaurant} is not available at {station}.")
            }
            Rejection::WeeklyOff { weekday, .. } => {
                format!("The restaurant is closed on {weekday}.")
            }
            Rejection::HolidayClosed { until, .. } => format!(
                "The restaurant is closed for a holiday until {}.",
                until.format("%d %b %Y %H:%M")
            ),
            Rejection::CutoffExceeded { cutoff_minutes, .. } => format!(
                "Orders close {cutoff_minutes} minutes before arrival."
            ),
            Rejection::RestroTimeMismatch { arrival, hours } => format!(
                "The restaurant is open {} to {}, but the train arrives at {}.",
                hours.start.to_12h(),
                hours.end.to_12h(),
                arrival.to_12h()
            ),
            Rejection::ItemUnavailable { items } => {
                format!("{} item(s) in your cart are no longer available.", items.len())
            }
            Rejection::ItemTimeMismatch { arrival, items } => format!(
                "{} item(s) cannot be served at {}.",
                items.len(),
                arrival.to_12h()
            ),
            Rejection::MinOrderNotMet { min_order, .. } => format!(
                "Minimum order value is ₹{}.",
                format_amount(*min_order)
            ),
        }
    }

    /// Context for rendering the message client-side.
    pub fn meta(&self) -> Value {
        match self {
            Rejection::EmptyCart => json!({}),
            Rejection::TrainNotFound { train } => json!({ "train": train }),
            Rejection::StationNotOnRoute { train, station } => {
                json!({ "train": train, "station": station })
            }
            Rejection::NotRunningOnDate { train, date } => json!({
                "train": train,
                "date": date,
                "weekday": crate::domain::weekday_code(chrono::Datelike::weekday(date)),
            }),
            Rejection::InvalidArrivalTime { station } => json!({ "station": station }),
            Rejection::RestaurantNotFound { restaurant, station } => {
                json!({ "restaurant": restaurant, "station": station })
            }
            Rejection::WeeklyOff { date, weekday } => json!({ "date": date, "weekday": weekday }),
            Rejection::HolidayClosed { arrival, until } => json!({
                "arrival": local(*arrival),
                "until": until.to_rfc3339(),
            }),
            Rejection::CutoffExceeded {
                arrival,
                cutoff_minutes,
                deadline,
            } => json!({
                "arrival": local(*arrival),
                "cutoffMinutes": cutoff_minutes,
                "deadline": deadline.map(local),
            }),
            Rejection::RestroTimeMismatch { arrival, hours } => json!({
                "arrival": arrival,
                "open": hours.start,
                "close": hours.end,
            }),
            Rejection::ItemUnavailable { items } => json!({ "items": items }),
            Rejection::ItemTimeMismatch { arrival, items } => json!({
                "arrival": arrival,
                "items": items
                    .iter()
                    .map(|i| json!({
                        "id": i.id,
                        "name": i.name,
                        "start": i.window.map(|w| w.start),
                        "end": i.window.map(|w| w.end),
                    }))
                    .collect::<Vec<_>>(),
            }),
            Rejection::MinOrderNotMet {
                min_order,
                subtotal,
            } => json!({
                "minOrder": amount(*min_order),
                "subtotal": amount(*subtotal),
            }),
        }
    }
}

/// A successful resolution: everything needed to render the checkout
/// summary and to commit the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligible {
    pub train: TrainSummary,
    pub stop: ProjectedStop,
    /// Local arrival instant at the delivery station.
    pub arrival: NaiveDateTime,
    pub restaurant: AvailableRestaurant,
    pub lines: Vec<PricedLine>,
    pub bill: Bill,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn station() -> StationCode {
        StationCode::parse("NDLS").unwrap()
    }

    #[test]
    fn codes_and_classes() {
        let cases = [
            (Rejection::EmptyCart, "empty_cart", RejectionClass::InvalidInput),
            (
                Rejection::TrainNotFound { train: "99999".into() },
                "train_not_found",
                RejectionClass::NotFound,
            ),
            (
                Rejection::StationNotOnRoute {
                    train: TrainNumber(12345),
                    station: station(),
                },
                "station_not_on_route",
                RejectionClass::NotFound,
            ),
            (
                Rejection::InvalidArrivalTime { station: station() },
                "invalid_arrival_time",
                RejectionClass::InvalidInput,
            ),
            (
                Rejection::ItemUnavailable { items: vec![] },
                "item_unavailable",
                RejectionClass::BusinessRule,
            ),
        ];
        for (rejection, code, class) in cases {
            assert_eq!(rejection.code(), code);
            assert_eq!(rejection.class(), class);
        }
    }

    #[test]
    fn min_order_meta_is_numeric() {
        let r = Rejection::MinOrderNotMet {
            min_order: Decimal::from(200),
            subtotal: "150.00".parse().unwrap(),
        };
        assert_eq!(r.meta()["minOrder"], 200.0);
        assert_eq!(r.meta()["subtotal"], 150.0);
        assert_eq!(r.message(), "Minimum order value is ₹200.");
    }

    #[test]
    fn time_mismatch_meta() {
        let r = Rejection::RestroTimeMismatch {
            arrival: t("23:30"),
            hours: TimeWindow::new(t("10:00"), t("22:00")),
        };
        let meta = r.meta();
        assert_eq!(meta["arrival"], "23:30");
        assert_eq!(meta["open"], "10:00");
        assert_eq!(meta["close"], "22:00");
        assert!(r.message().contains("11:30 PM"));
    }

    #[test]
    fn item_mismatch_lists_windows() {
        let r = Rejection::ItemTimeMismatch {
            arrival: t("16:00"),
            items: vec![
                OffendingItem {
                    id: ItemId::new("m1"),
                    name: "Thali".into(),
                    window: Some(TimeWindow::new(t("11:00"), t("15:00"))),
                },
                OffendingItem {
                    id: ItemId::new("m2"),
                    name: "Broken".into(),
                    window: None,
                },
            ],
        };
        let meta = r.meta();
        assert_eq!(meta["items"][0]["start"], "11:00");
        assert_eq!(meta["items"][0]["end"], "15:00");
        assert!(meta["items"][1]["start"].is_null());
    }

    #[test]
    fn cutoff_meta() {
        let arrival = NaiveDate::from_ymd_opt(2025, 1, 27)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let r = Rejection::CutoffExceeded {
            arrival,
            cutoff_minutes: 90,
            deadline: Some(arrival - chrono::Duration::minutes(90)),
        };
        let meta = r.meta();
        assert_eq!(meta["cutoffMinutes"], 90);
        assert_eq!(meta["deadline"], "2025-01-27 13:00");
        assert_eq!(meta["arrival"], "2025-01-27 14:30");
    }
}
