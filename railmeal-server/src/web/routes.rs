//! HTTP route handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDateTime;
use tower_http::trace::TraceLayer;

use crate::domain::{ClockTime, OrderDraft, RestaurantCode, StationCode, TrainIdentifier};
use crate::drafts::DraftId;
use crate::eligibility::{
    EligibilityRequest, Eligible, Rejection, Resolver, available_restaurants, filter_menu, locate,
};
use crate::orders::place_order;
use crate::pricing::{note_displayed_charge, price_cart, quote};
use crate::store::DataStore;

use super::dto::*;
use super::error::ApiError;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: DataStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/trains/:train/route", get(train_route::<S>))
        .route(
            "/api/trains/:train/stations/:station/restaurants",
            get(stop_restaurants::<S>),
        )
        .route("/api/stations/:station/restaurants", get(station_restaurants::<S>))
        .route("/api/restaurants/:code/menu", get(restaurant_menu::<S>))
        .route("/api/eligibility", post(check_eligibility::<S>))
        .route("/api/cart/quote", post(quote_cart::<S>))
        .route("/api/drafts", post(create_draft::<S>))
        .route(
            "/api/drafts/:id",
            get(get_draft::<S>)
                .put(replace_draft::<S>)
                .delete(clear_draft::<S>),
        )
        .route("/api/drafts/:id/checkout", post(checkout_draft::<S>))
        .route("/api/orders", post(create_order::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

fn ok<T>(body: T) -> ApiResult<T> {
    Ok(Json(Success::new(body)))
}

fn station_param(raw: &str) -> Result<StationCode, ApiError> {
    StationCode::parse_normalized(raw)
        .map_err(|_| ApiError::MissingParams(format!("Invalid station code: {raw}")))
}

fn time_param(name: &str, raw: &str) -> Result<ClockTime, ApiError> {
    ClockTime::parse(raw).map_err(|_| ApiError::MissingParams(format!("Invalid {name}: {raw}")))
}

fn draft_param(raw: &str) -> Result<DraftId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::DraftNotFound(raw.to_string()))
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// A train's stops with the date the train reaches each one.
async fn train_route<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(train): Path<String>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> ApiResult<RouteResponse> {
    let Query(query) = query?;
    let not_found = || Rejection::TrainNotFound {
        train: train.trim().to_string(),
    };

    let id = TrainIdentifier::parse(&train).ok_or_else(not_found)?;
    let route = locate(state.store.as_ref(), &id)
        .await?
        .ok_or_else(not_found)?;
    let running = route
        .running_on(query.date, state.eligibility.running_day_policy)
        .ok_or(Rejection::NotRunningOnDate {
            train: route.number,
            date: query.date,
        })?;

    ok(RouteResponse {
        train: running.summary(),
        journey_date: query.date,
        stops: running.project(query.date, query.boarding.as_ref()),
    })
}

/// Restaurants that can serve a train at one of its stops.
async fn stop_restaurants<S: DataStore>(
    State(state): State<AppState<S>>,
    Path((train, station)): Path<(String, String)>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> ApiResult<StopRestaurantsResponse> {
    let Query(query) = query?;
    let station = station_param(&station)?;

    let located = Resolver::new(state.store.as_ref(), &state.eligibility, &state.pricing)
        .locate_stop(&train, &station, query.date, query.boarding.as_ref())
        .await?;
    let restaurants =
        available_restaurants(state.store.as_ref(), &station, located.arrival, &state.eligibility)
            .await?;

    ok(StopRestaurantsResponse {
        train: located.route.summary(),
        stop: located.stop,
        arrival: located.arrival,
        restaurants,
    })
}

/// Restaurants available at a station at a given local date and time.
async fn station_restaurants<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(station): Path<String>,
    query: Result<Query<StationRestaurantsQuery>, QueryRejection>,
) -> ApiResult<StationRestaurantsResponse> {
    let Query(query) = query?;
    let station = station_param(&station)?;
    let time = time_param("time", &query.time)?;
    let arrival = NaiveDateTime::new(query.date, time.to_naive_time());

    let restaurants =
        available_restaurants(state.store.as_ref(), &station, arrival, &state.eligibility).await?;

    ok(StationRestaurantsResponse {
        station,
        arrival,
        restaurants,
    })
}

/// Menu items a restaurant can serve at the arrival time.
async fn restaurant_menu<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
    query: Result<Query<MenuQuery>, QueryRejection>,
) -> ApiResult<MenuResponse> {
    let Query(query) = query?;
    let restaurant = RestaurantCode::new(&code)
        .ok_or_else(|| ApiError::MissingParams("Restaurant code is required".to_string()))?;
    let arrival = time_param("arrival", &query.arrival)?;

    let items = state.store.menu_items(&restaurant).await?;
    let items = filter_menu(items, arrival, query.sort, &state.menu);

    ok(MenuResponse {
        restaurant,
        arrival: arrival.to_string(),
        items,
    })
}

/// Run every eligibility check for an order without placing it.
async fn check_eligibility<S: DataStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<EligibilityRequest>, JsonRejection>,
) -> ApiResult<Eligible> {
    let Json(request) = body?;
    let now = state.now().naive_local();

    let eligible = Resolver::new(state.store.as_ref(), &state.eligibility, &state.pricing)
        .resolve(&request, now)
        .await?;

    ok(eligible)
}

/// Price a cart from the restaurant's current menu.
async fn quote_cart<S: DataStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<QuoteRequest>, JsonRejection>,
) -> ApiResult<QuoteResponse> {
    let Json(request) = body?;
    if request.cart.is_empty() {
        return Err(Rejection::EmptyCart.into());
    }

    let menu = state.store.menu_items(&request.restaurant).await?;
    let (lines, missing) = price_cart(&request.cart, &menu);
    if !missing.is_empty() {
        return Err(Rejection::ItemUnavailable { items: missing }.into());
    }

    let bill = quote(&lines, &state.pricing);
    note_displayed_charge(request.displayed_charge, &bill);

    ok(QuoteResponse { lines, bill })
}

async fn create_draft<S: DataStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<OrderDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = body?;
    let draft_id = state.drafts.create(draft).await;

    Ok((
        StatusCode::CREATED,
        Json(Success::new(DraftResponse::<OrderDraft> {
            draft_id,
            draft: None,
        })),
    ))
}

async fn get_draft<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<DraftResponse<OrderDraft>> {
    let draft_id = draft_param(&id)?;
    let draft = state
        .drafts
        .get(&draft_id)
        .await
        .ok_or(ApiError::DraftNotFound(id))?;

    ok(DraftResponse {
        draft_id,
        draft: Some(draft),
    })
}

async fn replace_draft<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<OrderDraft>, JsonRejection>,
) -> ApiResult<DraftResponse<OrderDraft>> {
    let draft_id = draft_param(&id)?;
    let Json(draft) = body?;

    if !state.drafts.replace(&draft_id, draft.clone()).await {
        return Err(ApiError::DraftNotFound(id));
    }

    ok(DraftResponse {
        draft_id,
        draft: Some(draft),
    })
}

async fn clear_draft<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<DraftResponse<OrderDraft>> {
    let draft_id = draft_param(&id)?;
    if !state.drafts.clear(&draft_id).await {
        return Err(ApiError::DraftNotFound(id));
    }

    ok(DraftResponse {
        draft_id,
        draft: None,
    })
}

/// Commit a stored draft. The draft is kept if the order is refused.
async fn checkout_draft<S: DataStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let draft_id = draft_param(&id)?;
    let draft = state
        .drafts
        .get(&draft_id)
        .await
        .ok_or(ApiError::DraftNotFound(id))?;

    let placed = place_order(
        state.store.as_ref(),
        &state.eligibility,
        &state.pricing,
        &draft,
        state.now(),
    )
    .await?;
    state.drafts.clear(&draft_id).await;

    Ok((StatusCode::CREATED, Json(Success::new(placed))))
}

/// Commit a draft sent inline.
async fn create_order<S: DataStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<OrderDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = body?;

    let placed = place_order(
        state.store.as_ref(),
        &state.eligibility,
        &state.pricing,
        &draft,
        state.now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(Success::new(placed))))
}
