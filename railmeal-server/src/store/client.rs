//! REST gateway client.
//!
//! Talks to the store through PostgREST conventions: one resource per table,
//! filters as `column=op.value` query parameters, `order=` for sorting and
//! `Prefer: return=representation` to get generated ids back from inserts.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{
    HolidayWindow, MenuItem, Restaurant, RestaurantCode, RouteStop, StationCode, TrainNumber,
    fixed_offset,
};

use super::DataStore;
use super::convert::{
    convert_holidays, convert_menu_items, convert_restaurants, convert_route, decode_rows,
};
use super::error::StoreError;
use super::types::{
    HolidayRow, MenuItemRow, NewOrder, OrderId, RestaurantRow, RouteRow, StatusEntry, tables,
};

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 6;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Default offset for timestamps stored without one (IST).
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Default column holding a restaurant's code in the restaurant table and
/// the foreign key in child tables.
const DEFAULT_RESTAURANT_KEY: &str = "restro_code";

/// Configuration for the REST store.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Gateway base URL, e.g. `https://db.example.com/rest/v1`
    pub base_url: String,
    /// API key, sent as `apikey` and as a bearer token
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Column used to look up restaurants and their child rows
    pub restaurant_key: String,
    /// Offset for timestamps stored without one
    pub local_offset: FixedOffset,
}

impl RestStoreConfig {
    /// Create a new config for the given gateway.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            restaurant_key: DEFAULT_RESTAURANT_KEY.to_string(),
            local_offset: fixed_offset(DEFAULT_UTC_OFFSET_MINUTES),
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set the restaurant key column.
    pub fn with_restaurant_key(mut self, column: impl Into<String>) -> Self {
        self.restaurant_key = column.into();
        self
    }

    /// Set the offset used for timestamps without one.
    pub fn with_local_offset(mut self, offset: FixedOffset) -> Self {
        self.local_offset = offset;
        self
    }
}

/// Store client over a PostgREST gateway.
///
/// Uses a semaphore to limit concurrent requests to the gateway.
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    restaurant_key: String,
    local_offset: FixedOffset,
    semaphore: Arc<Semaphore>,
}

impl RestStore {
    /// Create a new store client with the given configuration.
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let invalid_key = || StoreError::Api {
            status: 0,
            message: "Invalid API key format".to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.api_key).map_err(|_| invalid_key())?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| invalid_key())?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            restaurant_key: config.restaurant_key,
            local_offset: config.local_offset,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    fn url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// GET rows from a table with the given filters.
    async fn select(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>, StoreError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable("semaphore closed".to_string()))?;

        debug!(table, ?query, "store select");

        let response = self
            .http
            .get(self.url(table))
            .query(query)
            .send()
            .await
            .map_err(http_error)?;

        let body = check_status(response).await?;

        serde_json::from_str::<Vec<Value>>(&body).map_err(|e| StoreError::Json {
            message: format!("{table}: {e}"),
        })
    }

    /// POST one row into a table and return the response body.
    async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
        return_row: bool,
    ) -> Result<String, StoreError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable("semaphore closed".to_string()))?;

        let prefer = if return_row {
            "return=representation"
        } else {
            "return=minimal"
        };

        let response = self
            .http
            .post(self.url(table))
            .header("Prefer", prefer)
            .json(row)
            .send()
            .await
            .map_err(http_error)?;

        check_status(response).await
    }

    fn restaurant_filter(&self, code: &RestaurantCode) -> (&str, String) {
        (self.restaurant_key.as_str(), format!("eq.{}", code.as_str()))
    }
}

/// Timeouts get their own variant so callers can tell them apart.
fn http_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Http(e)
    }
}

/// Map the response status to an error, or return the body.
async fn check_status(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(StoreError::Unauthorized);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(StoreError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            message: body.chars().take(500).collect(),
        });
    }

    response.text().await.map_err(http_error)
}

/// Make text safe inside a quoted PostgREST `ilike` pattern.
fn like_pattern(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '*' | '%' | '(' | ')' | ','))
        .collect();
    format!("\"*{cleaned}*\"")
}

/// Pull the generated id out of an insert's returned representation.
fn inserted_id(body: &str) -> Result<OrderId, StoreError> {
    let rows: Vec<Value> = serde_json::from_str(body).map_err(|e| StoreError::Json {
        message: format!("{}: {e}", tables::ORDERS),
    })?;

    rows.first()
        .and_then(|row| row.get("id").or_else(|| row.get("order_id")))
        .and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .map(OrderId)
        .ok_or_else(|| StoreError::Json {
            message: "insert returned no id".to_string(),
        })
}

impl DataStore for RestStore {
    async fn route_by_number(&self, number: TrainNumber) -> Result<Vec<RouteStop>, StoreError> {
        let rows = self
            .select(
                tables::ROUTES,
                &[
                    ("train_number", format!("eq.{number}")),
                    ("order", "stop_sequence.asc".to_string()),
                ],
            )
            .await?;
        Ok(convert_route(&decode_rows::<RouteRow>(rows, tables::ROUTES)))
    }

    async fn route_matching(&self, text: &str) -> Result<Vec<RouteStop>, StoreError> {
        let pattern = like_pattern(text);
        let rows = self
            .select(
                tables::ROUTES,
                &[
                    (
                        "or",
                        format!("(train_name.ilike.{pattern},train_number_text.ilike.{pattern})"),
                    ),
                    ("order", "train_number.asc,stop_sequence.asc".to_string()),
                ],
            )
            .await?;
        Ok(convert_route(&decode_rows::<RouteRow>(rows, tables::ROUTES)))
    }

    async fn restaurants_at(&self, station: &StationCode) -> Result<Vec<Restaurant>, StoreError> {
        let rows = self
            .select(
                tables::RESTAURANTS,
                &[("station_code", format!("eq.{station}"))],
            )
            .await?;
        Ok(convert_restaurants(&decode_rows::<RestaurantRow>(
            rows,
            tables::RESTAURANTS,
        )))
    }

    async fn restaurant(&self, code: &RestaurantCode) -> Result<Option<Restaurant>, StoreError> {
        let rows = self
            .select(
                tables::RESTAURANTS,
                &[self.restaurant_filter(code), ("limit", "1".to_string())],
            )
            .await?;
        Ok(
            convert_restaurants(&decode_rows::<RestaurantRow>(rows, tables::RESTAURANTS))
                .into_iter()
                .next(),
        )
    }

    async fn active_holidays(&self, code: &RestaurantCode) -> Result<Vec<HolidayWindow>, StoreError> {
        let rows = self
            .select(
                tables::HOLIDAYS,
                &[
                    self.restaurant_filter(code),
                    ("deleted_at", "is.null".to_string()),
                    ("order", "start_at.asc".to_string()),
                ],
            )
            .await?;
        let windows = convert_holidays(
            &decode_rows::<HolidayRow>(rows, tables::HOLIDAYS),
            self.local_offset,
        );
        Ok(windows.into_iter().filter(HolidayWindow::is_active).collect())
    }

    async fn menu_items(&self, code: &RestaurantCode) -> Result<Vec<MenuItem>, StoreError> {
        let rows = self
            .select(
                tables::MENU_ITEMS,
                &[self.restaurant_filter(code), ("status", "eq.ON".to_string())],
            )
            .await?;
        let items = convert_menu_items(&decode_rows::<MenuItemRow>(rows, tables::MENU_ITEMS));
        Ok(items.into_iter().filter(MenuItem::is_on).collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        let body = self.insert(tables::ORDERS, order, true).await?;
        inserted_id(&body)
    }

    async fn insert_status(&self, entry: &StatusEntry) -> Result<(), StoreError> {
        self.insert(tables::ORDER_STATUS_HISTORY, entry, false)
            .await
            .map(|_| ())
    }
}
