//! Data transfer objects for web requests and responses.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Cart, MenuItem, RestaurantCode, StationCode};
use crate::drafts::DraftId;
use crate::eligibility::{AvailableRestaurant, MenuSort, ProjectedStop, TrainSummary};
use crate::pricing::{Bill, PricedLine};

/// Successful response body: `{"success": true, ...}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

impl<T> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Query for a train's route.
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    /// Journey (boarding) date
    pub date: NaiveDate,

    /// Station where the passenger boards
    pub boarding: Option<StationCode>,
}

/// A train's route projected onto a journey date.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub train: TrainSummary,
    pub journey_date: NaiveDate,
    pub stops: Vec<ProjectedStop>,
}

/// Restaurants available at one stop of a train.
#[derive(Debug, Serialize)]
pub struct StopRestaurantsResponse {
    pub train: TrainSummary,
    pub stop: ProjectedStop,
    pub arrival: NaiveDateTime,
    pub restaurants: Vec<AvailableRestaurant>,
}

/// Query for restaurants at a station at an explicit local date and time.
#[derive(Debug, Deserialize)]
pub struct StationRestaurantsQuery {
    pub date: NaiveDate,

    /// Arrival time, HH:MM
    pub time: String,
}

/// Restaurants available at a station.
#[derive(Debug, Serialize)]
pub struct StationRestaurantsResponse {
    pub station: StationCode,
    pub arrival: NaiveDateTime,
    pub restaurants: Vec<AvailableRestaurant>,
}

/// Query for a restaurant's menu.
#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    /// Arrival time, HH:MM
    pub arrival: String,

    #[serde(default)]
    pub sort: MenuSort,
}

/// Menu items served at the arrival time.
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub restaurant: RestaurantCode,
    pub arrival: String,
    pub items: Vec<MenuItem>,
}

/// Request to price a cart.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub restaurant: RestaurantCode,

    #[serde(default)]
    pub cart: Cart,

    /// Platform charge the client displayed
    #[serde(default)]
    pub displayed_charge: Option<Decimal>,
}

/// Priced cart.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub lines: Vec<PricedLine>,
    pub bill: Bill,
}

/// A stored draft.
#[derive(Debug, Serialize)]
pub struct DraftResponse<T> {
    pub draft_id: DraftId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<T>,
}
