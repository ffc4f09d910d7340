//! Conversion from store rows to domain types.
//!
//! This is the only place where loosely-shaped store data is normalized:
//! restaurant identifiers under several column names, active flags as
//! bool/number/string, amounts as number or string, times with or without
//! seconds, timestamps with or without an offset. Everything past this
//! module works with strict domain types.
//!
//! List conversions skip bad rows with a warning instead of failing the
//! whole list.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{
    ClockTime, DietaryCategory, HolidayWindow, ItemId, ItemStatus, MenuItem, Restaurant,
    RestaurantCode, RouteStop, RunningDays, StationCode, TimeWindow, TrainNumber, WeeklyOff,
};

use super::types::{HolidayRow, MenuItemRow, RestaurantRow, RouteRow};

/// Error during row to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Failed to parse a station code
    #[error("invalid station code: {0}")]
    InvalidStation(String),

    /// Missing or unusable required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field was present but could not be interpreted
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Column names a restaurant's own identifier has been stored under, in
/// priority order.
const RESTAURANT_ID_KEYS: &[&str] = &[
    "restaurant_code",
    "restro_code",
    "RestroCode",
    "restaurantCode",
    "outlet_id",
    "restaurant_id",
    "id",
];

/// Column names a foreign key to a restaurant has been stored under. `id`
/// is excluded: on child tables it is the child's own key.
const RESTAURANT_REF_KEYS: &[&str] = &[
    "restaurant_code",
    "restro_code",
    "RestroCode",
    "restaurantCode",
    "outlet_id",
    "restaurant_id",
];

/// Decode raw JSON rows one by one, skipping rows that do not deserialize.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(table, error = %e, "skipping undecodable row");
                None
            }
        })
        .collect()
}

/// Coerce an active flag to a boolean.
///
/// Absent, null and unrecognised values count as active.
///
/// ```
/// use railmeal_server::store::normalize_active_flag;
/// use serde_json::json;
///
/// assert!(normalize_active_flag(None));
/// assert!(normalize_active_flag(Some(&json!(1))));
/// assert!(!normalize_active_flag(Some(&json!("N"))));
/// assert!(!normalize_active_flag(Some(&json!(false))));
/// assert!(normalize_active_flag(Some(&json!("maybe"))));
/// ```
pub fn normalize_active_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_none_or(|f| f != 0.0),
        Some(Value::String(s)) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "n" | "off" | "inactive" | "disabled"
        ),
        Some(_) => true,
    }
}

/// A scalar as trimmed, non-empty text.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_key(map: &Map<String, Value>, keys: &[&str]) -> Option<RestaurantCode> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find_map(|v| value_text(v).and_then(RestaurantCode::new))
}

/// The restaurant's own code, from whichever identifier column is present.
pub fn restaurant_code_of(row: &Map<String, Value>) -> Option<RestaurantCode> {
    first_key(row, RESTAURANT_ID_KEYS)
}

/// The restaurant a child row (holiday, menu item) belongs to.
pub fn restaurant_ref_of(row: &Map<String, Value>) -> Option<RestaurantCode> {
    first_key(row, RESTAURANT_REF_KEYS)
}

/// A decimal from a JSON number or numeric string (a leading "₹" is
/// tolerated).
pub fn normalize_decimal(value: Option<&Value>) -> Option<Decimal> {
    let text = match value? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_start_matches('₹').trim().to_string(),
        _ => return None,
    };
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// A strictly positive amount. Zero, negative and unparseable values mean
/// "no amount".
pub fn normalize_positive_amount(value: Option<&Value>) -> Option<Decimal> {
    normalize_decimal(value).filter(|d| d.is_sign_positive() && !d.is_zero())
}

/// A non-negative whole number of minutes.
pub fn normalize_minutes(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// A time column; blanks, "--" and other placeholders become `None`.
pub fn optional_time(value: Option<&str>) -> Option<ClockTime> {
    ClockTime::parse(value?).ok()
}

/// Parse a timestamp. Values without an offset are read in `local`.
pub fn parse_timestamp(s: &str, local: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt);
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    local.from_local_datetime(&naive).single()
}

/// Convert timetable rows, sorted by train then stop sequence.
///
/// A repeated sequence number for the same train keeps the first row.
pub fn convert_route(rows: &[RouteRow]) -> Vec<RouteStop> {
    let mut stops: Vec<RouteStop> = rows
        .iter()
        .filter_map(|row| match convert_route_row(row) {
            Ok(stop) => Some(stop),
            Err(e) => {
                warn!(station = %row.station_code, error = %e, "skipping route row");
                None
            }
        })
        .collect();

    // Stable sort keeps store order among duplicates
    stops.sort_by_key(|s| (s.train_number, s.sequence));
    stops.dedup_by_key(|s| (s.train_number, s.sequence));
    stops
}

/// Convert a single timetable row.
pub fn convert_route_row(row: &RouteRow) -> Result<RouteStop, ConversionError> {
    let train_number = value_text(&row.train_number)
        .and_then(|t| t.parse::<u32>().ok())
        .map(TrainNumber)
        .ok_or(ConversionError::MissingField("train_number"))?;

    let station = StationCode::parse_normalized(&row.station_code)
        .map_err(|_| ConversionError::InvalidStation(row.station_code.clone()))?;

    let sequence = normalize_minutes(Some(&row.stop_sequence)).ok_or_else(|| {
        ConversionError::InvalidField {
            field: "stop_sequence",
            value: row.stop_sequence.to_string(),
        }
    })?;

    let day_offset = normalize_minutes(row.day_offset.as_ref())
        .filter(|d| *d >= 1)
        .unwrap_or(1);

    Ok(RouteStop {
        train_number,
        train_name: row.train_name.clone().unwrap_or_default().trim().to_string(),
        station,
        station_name: row.station_name.clone().unwrap_or_default().trim().to_string(),
        sequence,
        arrival: optional_time(row.arrival_time.as_deref()),
        departure: optional_time(row.departure_time.as_deref()),
        running_days: RunningDays::parse(row.running_days.as_deref()),
        day_offset,
    })
}

/// Convert a restaurant row.
pub fn convert_restaurant(row: &RestaurantRow) -> Result<Restaurant, ConversionError> {
    let code = restaurant_code_of(&row.other).ok_or(ConversionError::MissingField("restaurant_code"))?;

    let station = StationCode::parse_normalized(&row.station_code)
        .map_err(|_| ConversionError::InvalidStation(row.station_code.clone()))?;

    let hours = match (row.open_time.as_deref(), row.close_time.as_deref()) {
        (Some(open), Some(close)) => TimeWindow::parse(open, close),
        _ => None,
    };

    Ok(Restaurant {
        name: row.name.clone().unwrap_or_else(|| code.to_string()),
        code,
        station,
        is_active: normalize_active_flag(row.is_active.as_ref()),
        hours,
        min_order_value: normalize_positive_amount(row.min_order_value.as_ref()),
        weekly_off: WeeklyOff::parse(row.weekly_off.as_deref()),
        cutoff_minutes: normalize_minutes(row.cut_off_minutes.as_ref()),
    })
}

/// Convert restaurant rows, skipping bad ones.
pub fn convert_restaurants(rows: &[RestaurantRow]) -> Vec<Restaurant> {
    rows.iter()
        .filter_map(|row| match convert_restaurant(row) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(station = %row.station_code, error = %e, "skipping restaurant row");
                None
            }
        })
        .collect()
}

/// Convert a holiday row.
pub fn convert_holiday(
    row: &HolidayRow,
    local: FixedOffset,
) -> Result<HolidayWindow, ConversionError> {
    let restaurant =
        restaurant_ref_of(&row.other).ok_or(ConversionError::MissingField("restaurant_code"))?;

    let start_at = parse_timestamp(&row.start_at, local).ok_or_else(|| {
        ConversionError::InvalidField {
            field: "start_at",
            value: row.start_at.clone(),
        }
    })?;
    let end_at =
        parse_timestamp(&row.end_at, local).ok_or_else(|| ConversionError::InvalidField {
            field: "end_at",
            value: row.end_at.clone(),
        })?;

    // Any non-blank deleted_at marks the row deleted, even if unparseable
    let deleted_at = match row.deleted_at.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(parse_timestamp(s, local).unwrap_or(start_at)),
    };

    Ok(HolidayWindow {
        restaurant,
        start_at,
        end_at,
        deleted_at,
    })
}

/// Convert holiday rows, skipping bad ones.
pub fn convert_holidays(rows: &[HolidayRow], local: FixedOffset) -> Vec<HolidayWindow> {
    rows.iter()
        .filter_map(|row| match convert_holiday(row, local) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "skipping holiday row");
                None
            }
        })
        .collect()
}

/// Convert a menu item row.
///
/// A missing selling price is derived from base price and GST. A missing
/// status is treated as OFF.
pub fn convert_menu_item(row: &MenuItemRow) -> Result<MenuItem, ConversionError> {
    let id = value_text(&row.id)
        .map(ItemId::new)
        .ok_or(ConversionError::MissingField("id"))?;

    let restaurant =
        restaurant_ref_of(&row.other).ok_or(ConversionError::MissingField("restaurant_code"))?;

    let status = match row.status.as_deref() {
        None => ItemStatus::Off,
        Some(s) => ItemStatus::parse(s).ok_or_else(|| ConversionError::InvalidField {
            field: "status",
            value: s.to_string(),
        })?,
    };

    let base_price = normalize_decimal(row.base_price.as_ref()).filter(|d| !d.is_sign_negative());
    let gst_percent = normalize_decimal(row.gst_percent.as_ref())
        .filter(|d| !d.is_sign_negative())
        .unwrap_or_default();

    let selling_price = normalize_decimal(row.selling_price.as_ref())
        .filter(|d| !d.is_sign_negative())
        .or_else(|| {
            base_price.map(|b| {
                (b + b * gst_percent / Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            })
        })
        .ok_or(ConversionError::MissingField("selling_price"))?;

    let service_window = match (row.start_time.as_deref(), row.end_time.as_deref()) {
        (Some(start), Some(end)) => TimeWindow::parse(start, end),
        _ => None,
    };

    Ok(MenuItem {
        id,
        restaurant,
        name: row.name.trim().to_string(),
        description: row.description.clone().filter(|d| !d.trim().is_empty()),
        dietary: DietaryCategory::parse(row.dietary_category.as_deref()),
        cuisine: row.cuisine.clone().filter(|c| !c.trim().is_empty()),
        menu_group: row.menu_type.clone().filter(|m| !m.trim().is_empty()),
        service_window,
        base_price: base_price.unwrap_or(selling_price),
        gst_percent,
        selling_price,
        status,
    })
}

/// Convert menu rows, skipping bad ones.
pub fn convert_menu_items(rows: &[MenuItemRow]) -> Vec<MenuItem> {
    rows.iter()
        .filter_map(|row| match convert_menu_item(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "skipping menu row");
                None
            }
        })
        .collect()
}
