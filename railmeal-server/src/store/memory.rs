//! In-memory store for development and testing without a database.
//!
//! Loads fixture tables from JSON files and serves them as if they were the
//! live store. Inserted orders are kept in memory. Lookups can be told to
//! fail or stall, to exercise the fail-open and timeout paths.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::FixedOffset;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{
    HolidayWindow, MenuItem, Restaurant, RestaurantCode, RouteStop, StationCode, TrainNumber,
};

use super::DataStore;
use super::convert::{
    convert_holidays, convert_menu_items, convert_restaurants, convert_route, decode_rows,
};
use super::error::StoreError;
use super::types::{HolidayRow, MenuItemRow, NewOrder, OrderId, RestaurantRow, RouteRow, StatusEntry, tables};

/// Fixture file names, one per table.
const ROUTES_FILE: &str = "routes.json";
const RESTAURANTS_FILE: &str = "restaurants.json";
const HOLIDAYS_FILE: &str = "holidays.json";
const MENU_FILE: &str = "menu_items.json";

#[derive(Debug, Default)]
struct Tables {
    routes: Vec<RouteStop>,
    restaurants: Vec<Restaurant>,
    holidays: Vec<HolidayWindow>,
    menu: Vec<MenuItem>,
    orders: Vec<(OrderId, NewOrder)>,
    history: Vec<StatusEntry>,
}

/// Injected failures.
#[derive(Debug, Default, Clone)]
struct Faults {
    failing_holidays: HashSet<RestaurantCode>,
    slow_holidays: HashMap<RestaurantCode, Duration>,
    holiday_delay: Option<Duration>,
    fail_orders: bool,
    fail_status: bool,
}

#[derive(Debug, Default)]
struct Counters {
    route_lookups: AtomicUsize,
    holidays_in_flight: AtomicUsize,
    max_holidays_in_flight: AtomicUsize,
}

/// Store that serves fixture data from memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
    counters: Arc<Counters>,
}

/// Builder for `MemoryStore`.
#[derive(Debug, Default)]
pub struct MemoryStoreBuilder {
    tables: Tables,
    faults: Faults,
}

impl MemoryStoreBuilder {
    pub fn route(mut self, stops: impl IntoIterator<Item = RouteStop>) -> Self {
        self.tables.routes.extend(stops);
        self
    }

    pub fn restaurant(mut self, restaurant: Restaurant) -> Self {
        self.tables.restaurants.push(restaurant);
        self
    }

    pub fn holiday(mut self, window: HolidayWindow) -> Self {
        self.tables.holidays.push(window);
        self
    }

    pub fn menu_item(mut self, item: MenuItem) -> Self {
        self.tables.menu.push(item);
        self
    }

    /// Make holiday lookups for `code` return an error.
    pub fn fail_holidays_for(mut self, code: RestaurantCode) -> Self {
        self.faults.failing_holidays.insert(code);
        self
    }

    /// Make holiday lookups for `code` take `delay` before answering.
    pub fn slow_holidays_for(mut self, code: RestaurantCode, delay: Duration) -> Self {
        self.faults.slow_holidays.insert(code, delay);
        self
    }

    /// Delay every holiday lookup, so concurrent lookups overlap.
    pub fn holiday_delay(mut self, delay: Duration) -> Self {
        self.faults.holiday_delay = Some(delay);
        self
    }

    /// Make order inserts fail.
    pub fn fail_order_writes(mut self) -> Self {
        self.faults.fail_orders = true;
        self
    }

    /// Make status history inserts fail.
    pub fn fail_status_writes(mut self) -> Self {
        self.faults.fail_status = true;
        self
    }

    pub fn build(mut self) -> MemoryStore {
        // Same ordering and de-duplication as rows coming from the store
        self.tables.routes.sort_by_key(|s| (s.train_number, s.sequence));
        self.tables.routes.dedup_by_key(|s| (s.train_number, s.sequence));

        MemoryStore {
            tables: Arc::new(RwLock::new(self.tables)),
            faults: Arc::new(self.faults),
            counters: Arc::new(Counters::default()),
        }
    }
}

fn read_table(dir: &Path, file: &str) -> Result<Option<Vec<Value>>, StoreError> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path).map_err(|e| StoreError::Fixture {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StoreError::Fixture {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
}

impl MemoryStore {
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    /// Load fixture tables from a directory.
    ///
    /// Expects any of `routes.json`, `restaurants.json`, `holidays.json` and
    /// `menu_items.json`, each a JSON array of raw store rows. Rows go
    /// through the same normalization as live data. Timestamps without an
    /// offset are read in `local`.
    pub fn from_dir(dir: impl AsRef<Path>, local: FixedOffset) -> Result<Self, StoreError> {
        let dir = dir.as_ref();

        let routes = read_table(dir, ROUTES_FILE)?;
        let restaurants = read_table(dir, RESTAURANTS_FILE)?;
        let holidays = read_table(dir, HOLIDAYS_FILE)?;
        let menu = read_table(dir, MENU_FILE)?;

        if routes.is_none() && restaurants.is_none() && holidays.is_none() && menu.is_none() {
            return Err(StoreError::Fixture {
                message: format!("No fixture files found in {}", dir.display()),
            });
        }

        let tables = Tables {
            routes: convert_route(&decode_rows::<RouteRow>(
                routes.unwrap_or_default(),
                tables::ROUTES,
            )),
            restaurants: convert_restaurants(&decode_rows::<RestaurantRow>(
                restaurants.unwrap_or_default(),
                tables::RESTAURANTS,
            )),
            holidays: convert_holidays(
                &decode_rows::<HolidayRow>(holidays.unwrap_or_default(), tables::HOLIDAYS),
                local,
            ),
            menu: convert_menu_items(&decode_rows::<MenuItemRow>(
                menu.unwrap_or_default(),
                tables::MENU_ITEMS,
            )),
            ..Tables::default()
        };

        debug!(
            routes = tables.routes.len(),
            restaurants = tables.restaurants.len(),
            holidays = tables.holidays.len(),
            menu = tables.menu.len(),
            "loaded fixtures"
        );

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            faults: Arc::new(Faults::default()),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Orders inserted so far, oldest first.
    pub async fn orders(&self) -> Vec<(OrderId, NewOrder)> {
        self.tables.read().await.orders.clone()
    }

    /// Status history rows written so far.
    pub async fn status_history(&self) -> Vec<StatusEntry> {
        self.tables.read().await.history.clone()
    }

    /// Add a holiday window after construction.
    pub async fn add_holiday(&self, window: HolidayWindow) {
        self.tables.write().await.holidays.push(window);
    }

    /// Number of route queries served (exact and fuzzy).
    pub fn route_lookup_count(&self) -> usize {
        self.counters.route_lookups.load(Ordering::SeqCst)
    }

    /// Highest number of holiday lookups that were in flight at once.
    pub fn max_concurrent_holiday_lookups(&self) -> usize {
        self.counters.max_holidays_in_flight.load(Ordering::SeqCst)
    }
}

/// Tracks in-flight holiday lookups for the lifetime of one call.
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.holidays_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters
            .max_holidays_in_flight
            .fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.holidays_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DataStore for MemoryStore {
    async fn route_by_number(&self, number: TrainNumber) -> Result<Vec<RouteStop>, StoreError> {
        self.counters.route_lookups.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read().await;
        Ok(tables
            .routes
            .iter()
            .filter(|s| s.train_number == number)
            .cloned()
            .collect())
    }

    async fn route_matching(&self, text: &str) -> Result<Vec<RouteStop>, StoreError> {
        self.counters.route_lookups.fetch_add(1, Ordering::SeqCst);
        let needle = text.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .routes
            .iter()
            .filter(|s| {
                s.train_name.to_lowercase().contains(&needle)
                    || s.train_number.to_string().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn restaurants_at(&self, station: &StationCode) -> Result<Vec<Restaurant>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .restaurants
            .iter()
            .filter(|r| &r.station == station)
            .cloned()
            .collect())
    }

    async fn restaurant(&self, code: &RestaurantCode) -> Result<Option<Restaurant>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.restaurants.iter().find(|r| &r.code == code).cloned())
    }

    async fn active_holidays(&self, code: &RestaurantCode) -> Result<Vec<HolidayWindow>, StoreError> {
        let _in_flight = InFlight::enter(&self.counters);

        if let Some(delay) = self.faults.holiday_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(delay) = self.faults.slow_holidays.get(code) {
            tokio::time::sleep(*delay).await;
        }
        if self.faults.failing_holidays.contains(code) {
            return Err(StoreError::Unavailable(format!("holidays for {code}")));
        }

        let tables = self.tables.read().await;
        Ok(tables
            .holidays
            .iter()
            .filter(|h| &h.restaurant == code && h.is_active())
            .cloned()
            .collect())
    }

    async fn menu_items(&self, code: &RestaurantCode) -> Result<Vec<MenuItem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .menu
            .iter()
            .filter(|m| &m.restaurant == code && m.is_on())
            .cloned()
            .collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        if self.faults.fail_orders {
            return Err(StoreError::Unavailable("orders".to_string()));
        }
        let mut tables = self.tables.write().await;
        let id = OrderId(format!("ORD{:06}", tables.orders.len() + 1));
        tables.orders.push((id.clone(), order.clone()));
        Ok(id)
    }

    async fn insert_status(&self, entry: &StatusEntry) -> Result<(), StoreError> {
        if self.faults.fail_status {
            return Err(StoreError::Unavailable("order_status_history".to_string()));
        }
        self.tables.write().await.history.push(entry.clone());
        Ok(())
    }
}
