//! Access to the relational data store.
//!
//! The store holds the static timetable, restaurants, their holiday windows
//! and menus, and receives committed orders. It is external to this service:
//! production talks to it through a PostgREST-style gateway (`RestStore`),
//! development and tests use `MemoryStore` loaded from JSON fixtures.
//!
//! Both implementations normalize rows through `convert`, so everything
//! returned from a `DataStore` is strictly typed.

mod client;
mod convert;
mod error;
mod memory;
mod types;

use std::future::Future;

pub use client::{RestStore, RestStoreConfig};
pub use convert::{
    ConversionError, convert_holiday, convert_menu_item, convert_restaurant, convert_route,
    decode_rows, normalize_active_flag, normalize_decimal, normalize_minutes,
    normalize_positive_amount, parse_timestamp, restaurant_code_of,
};
pub use error::StoreError;
pub use memory::{MemoryStore, MemoryStoreBuilder};
pub use types::{
    HolidayRow, MenuItemRow, NewOrder, OrderId, OrderLineRow, OrderStatus, RestaurantRow,
    RouteRow, StatusEntry, tables,
};

use crate::domain::{
    HolidayWindow, MenuItem, Restaurant, RestaurantCode, RouteStop, StationCode, TrainNumber,
};

/// Queries and inserts the service needs from the store.
///
/// Read methods apply the table's visibility rules themselves: holidays are
/// only returned while not soft-deleted, menu items only while ON.
pub trait DataStore: Send + Sync {
    /// All stops of one train, ordered by stop sequence.
    fn route_by_number(
        &self,
        number: TrainNumber,
    ) -> impl Future<Output = Result<Vec<RouteStop>, StoreError>> + Send;

    /// Stops of every train whose name or number contains `text`
    /// (case-insensitive), ordered by train number then stop sequence.
    fn route_matching(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<RouteStop>, StoreError>> + Send;

    /// Restaurants bound to a station, active or not.
    fn restaurants_at(
        &self,
        station: &StationCode,
    ) -> impl Future<Output = Result<Vec<Restaurant>, StoreError>> + Send;

    /// One restaurant by code.
    fn restaurant(
        &self,
        code: &RestaurantCode,
    ) -> impl Future<Output = Result<Option<Restaurant>, StoreError>> + Send;

    /// Holiday windows for a restaurant that have not been soft-deleted.
    fn active_holidays(
        &self,
        code: &RestaurantCode,
    ) -> impl Future<Output = Result<Vec<HolidayWindow>, StoreError>> + Send;

    /// ON menu items for a restaurant.
    fn menu_items(
        &self,
        code: &RestaurantCode,
    ) -> impl Future<Output = Result<Vec<MenuItem>, StoreError>> + Send;

    /// Insert an order, returning the generated identifier.
    fn insert_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<OrderId, StoreError>> + Send;

    /// Append a status history row.
    fn insert_status(
        &self,
        entry: &StatusEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
