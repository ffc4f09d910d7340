//! Row DTOs for the relational store.
//!
//! Read-side rows map directly to the JSON the store returns. Columns that
//! have historically arrived in several shapes (numbers as strings, flags as
//! "Y"/1/true, restaurant ids under different names) are kept as raw
//! `serde_json::Value`s here and normalized in `convert`.
//!
//! Write-side rows (`NewOrder`, `StatusEntry`) are what the order commit
//! inserts.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ItemId, PaymentMode, RestaurantCode, StationCode, TrainNumber};

/// Table names, as exposed by the REST gateway.
pub mod tables {
    pub const ROUTES: &str = "train_routes";
    pub const RESTAURANTS: &str = "restaurants";
    pub const HOLIDAYS: &str = "restaurant_holidays";
    pub const MENU_ITEMS: &str = "menu_items";
    pub const ORDERS: &str = "orders";
    pub const ORDER_STATUS_HISTORY: &str = "order_status_history";
}

/// One row of `train_routes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRow {
    pub train_number: Value,
    #[serde(default)]
    pub train_name: Option<String>,
    pub station_code: String,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(alias = "stn_serial_number", alias = "stop_seq")]
    pub stop_sequence: Value,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub running_days: Option<String>,
    #[serde(default, alias = "day")]
    pub day_offset: Option<Value>,
}

/// One row of `restaurants`.
///
/// The identifier column is collected from whatever key the row carries,
/// see `convert::restaurant_code_of`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantRow {
    pub station_code: String,
    #[serde(default, alias = "restro_name")]
    pub name: Option<String>,
    #[serde(default, alias = "active", alias = "isActive")]
    pub is_active: Option<Value>,
    #[serde(default)]
    pub open_time: Option<String>,
    #[serde(default)]
    pub close_time: Option<String>,
    #[serde(default, alias = "minimum_order")]
    pub min_order_value: Option<Value>,
    #[serde(default)]
    pub weekly_off: Option<String>,
    #[serde(default, alias = "cutoff_minutes")]
    pub cut_off_minutes: Option<Value>,
    /// Remaining columns, including the identifier under any of its names.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One row of `restaurant_holidays`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayRow {
    pub start_at: String,
    pub end_at: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One row of `menu_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemRow {
    #[serde(alias = "item_code")]
    pub id: Value,
    #[serde(alias = "item_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "item_category")]
    pub dietary_category: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub menu_type: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub base_price: Option<Value>,
    #[serde(default)]
    pub gst_percent: Option<Value>,
    #[serde(default)]
    pub selling_price: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Identifier assigned by the store to an inserted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order lifecycle states written by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Cash on delivery, accepted.
    Booked,
    /// Online payment not yet confirmed by the gateway.
    PaymentPending,
}

impl OrderStatus {
    pub fn initial_for(mode: PaymentMode) -> Self {
        match mode {
            PaymentMode::CashOnDelivery => OrderStatus::Booked,
            PaymentMode::Online => OrderStatus::PaymentPending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Booked => "booked",
            OrderStatus::PaymentPending => "payment_pending",
        }
    }
}

/// One priced line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRow {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// The `orders` row written at commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub train_number: TrainNumber,
    pub train_name: String,
    pub journey_date: NaiveDate,
    pub station_code: StationCode,
    pub restaurant_code: RestaurantCode,
    /// Projected local arrival at the delivery station.
    pub arrival_at: NaiveDateTime,
    pub passenger_name: String,
    pub passenger_mobile: String,
    pub pnr: Option<String>,
    pub coach: Option<String>,
    pub seat: Option<String>,
    pub payment_mode: PaymentMode,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineRow>,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub platform_charge: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<FixedOffset>,
}

/// One `order_status_history` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub changed_at: DateTime<FixedOffset>,
}
