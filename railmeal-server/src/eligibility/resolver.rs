//! Order eligibility resolution.
//!
//! Runs every check an order must pass, in a fixed order, and stops at the
//! first failure:
//!
//! 1. the cart is not empty
//! 2. the train exists (exact number, then partial match)
//! 3. it calls at the delivery station
//! 4. it runs on the journey date (per the configured policy)
//! 5. the stop has a usable time
//! 6. the restaurant exists, is active and serves that station
//! 7. it is not the restaurant's weekly off day
//! 8. no holiday window covers the arrival
//! 9. the booking cut-off has not passed
//! 10. the arrival is within restaurant hours
//! 11. every cart item is on the menu
//! 12. every cart item is served at the arrival time
//! 13. the subtotal meets the minimum order value
//!
//! Resolution reads the store but never writes it, and takes `now` as an
//! argument, so repeating a request against unchanged data gives the same
//! outcome.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    Cart, ClockTime, OrderDraft, RestaurantCode, StationCode, TrainIdentifier, weekday_code,
};
use crate::pricing::{PricingConfig, price_cart, quote};
use crate::store::{DataStore, StoreError};

use super::config::{EligibilityConfig, RunningDayPolicy};
use super::menu::is_served_at;
use super::outcome::{Eligible, OffendingItem, Rejection};
use super::projector::{ProjectedStop, boarding_offset, project_arrival_date};
use super::restaurants::{AvailableRestaurant, holiday_block, to_instant};
use super::route::{TrainRoute, locate};

/// Error from eligibility resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The order is not allowed
    #[error("order rejected: {}", .0.code())]
    Rejected(Rejection),

    /// The store could not be queried
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<Rejection> for ResolveError {
    fn from(rejection: Rejection) -> Self {
        ResolveError::Rejected(rejection)
    }
}

/// One order attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EligibilityRequest {
    /// Train number or name fragment.
    pub train: String,
    /// Delivery station.
    pub station: StationCode,
    /// Date the passenger boards.
    pub journey_date: NaiveDate,
    #[serde(default)]
    pub boarding_station: Option<StationCode>,
    pub restaurant: RestaurantCode,
    #[serde(default)]
    pub cart: Cart,
}

impl From<&OrderDraft> for EligibilityRequest {
    fn from(draft: &OrderDraft) -> Self {
        Self {
            train: draft.train.clone(),
            station: draft.station,
            journey_date: draft.journey_date,
            boarding_station: draft.boarding_station,
            restaurant: draft.restaurant.clone(),
            cart: draft.cart.clone(),
        }
    }
}

/// A located train and the projected stop at the delivery station.
#[derive(Debug, Clone)]
pub struct LocatedStop {
    pub route: TrainRoute,
    pub stop: ProjectedStop,
    pub arrival: NaiveDateTime,
}

/// Eligibility resolver over a store.
pub struct Resolver<'a, S> {
    store: &'a S,
    config: &'a EligibilityConfig,
    pricing: &'a PricingConfig,
}

impl<'a, S: DataStore> Resolver<'a, S> {
    pub fn new(store: &'a S, config: &'a EligibilityConfig, pricing: &'a PricingConfig) -> Self {
        Self {
            store,
            config,
            pricing,
        }
    }

    /// Locate the train, check it calls at `station` and runs on the date,
    /// and project the arrival there.
    pub async fn locate_stop(
        &self,
        train: &str,
        station: &StationCode,
        journey_date: NaiveDate,
        boarding: Option<&StationCode>,
    ) -> Result<LocatedStop, ResolveError> {
        let not_found = || Rejection::TrainNotFound {
            train: train.trim().to_string(),
        };

        let id = TrainIdentifier::parse(train).ok_or_else(not_found)?;
        let route = locate(self.store, &id).await?.ok_or_else(not_found)?;

        if route.stop_at(station).is_none() {
            return Err(Rejection::StationNotOnRoute {
                train: route.number,
                station: *station,
            }
            .into());
        }

        let not_running = || Rejection::NotRunningOnDate {
            train: route.number,
            date: journey_date,
        };
        let policy = self.config.running_day_policy;
        let running = route.running_on(journey_date, policy).ok_or_else(not_running)?;

        // The delivery stop itself may be filtered out while others survive
        let target = match (running.stop_at(station), policy) {
            (Some(stop), _) => stop,
            (None, RunningDayPolicy::Relaxed) => route.stop_at(station).ok_or_else(not_running)?,
            (None, RunningDayPolicy::Strict) => return Err(not_running().into()),
        };

        let offset = boarding_offset(&route.stops, boarding);
        let stop = ProjectedStop::new(
            target,
            project_arrival_date(journey_date, offset, target.day_offset),
        );
        let arrival = stop
            .arrival_at()
            .ok_or(Rejection::InvalidArrivalTime { station: *station })?;

        debug!(
            train = %route.number,
            station = %station,
            %arrival,
            "located stop"
        );

        Ok(LocatedStop {
            route: running,
            stop,
            arrival,
        })
    }

    /// Decide whether the order can be placed at `now` (local time).
    pub async fn resolve(
        &self,
        request: &EligibilityRequest,
        now: NaiveDateTime,
    ) -> Result<Eligible, ResolveError> {
        if request.cart.is_empty() {
            return Err(Rejection::EmptyCart.into());
        }

        let located = self
            .locate_stop(
                &request.train,
                &request.station,
                request.journey_date,
                request.boarding_station.as_ref(),
            )
            .await?;
        let arrival = located.arrival;

        let restaurant = self
            .store
            .restaurant(&request.restaurant)
            .await?
            .filter(|r| r.station == request.station && r.is_active)
            .ok_or_else(|| Rejection::RestaurantNotFound {
                restaurant: request.restaurant.clone(),
                station: request.station,
            })?;

        if restaurant.weekly_off.is_off(arrival.date()) {
            return Err(Rejection::WeeklyOff {
                date: arrival.date(),
                weekday: weekday_code(arrival.date().weekday()),
            }
            .into());
        }

        if let Some(instant) = to_instant(arrival, self.config.local_offset()) {
            if let Some(window) = holiday_block(self.store, &restaurant.code, instant, self.config).await {
                return Err(Rejection::HolidayClosed {
                    arrival,
                    until: window.end_at,
                }
                .into());
            }
        }

        let cutoff_minutes = restaurant.effective_cutoff(self.config.default_cutoff_minutes);
        let deadline = arrival.checked_sub_signed(Duration::minutes(i64::from(cutoff_minutes)));
        if deadline.is_none_or(|deadline| now > deadline) {
            return Err(Rejection::CutoffExceeded {
                arrival,
                cutoff_minutes,
                deadline,
            }
            .into());
        }

        let arrival_time = ClockTime::from(arrival.time());
        if let Some(hours) = restaurant.hours {
            if !hours.contains_same_day(arrival_time) {
                return Err(Rejection::RestroTimeMismatch {
                    arrival: arrival_time,
                    hours,
                }
                .into());
            }
        }

        let menu = self.store.menu_items(&restaurant.code).await?;
        let (lines, missing) = price_cart(&request.cart, &menu);
        if !missing.is_empty() {
            return Err(Rejection::ItemUnavailable { items: missing }.into());
        }

        let offending: Vec<OffendingItem> = request
            .cart
            .lines()
            .iter()
            .filter_map(|line| menu.iter().find(|m| m.id == line.item_id))
            .filter(|item| !is_served_at(item, arrival_time))
            .map(|item| OffendingItem {
                id: item.id.clone(),
                name: item.name.clone(),
                window: item.service_window,
            })
            .collect();
        if !offending.is_empty() {
            return Err(Rejection::ItemTimeMismatch {
                arrival: arrival_time,
                items: offending,
            }
            .into());
        }

        let bill = quote(&lines, self.pricing);
        if let Some(min_order) = restaurant.min_order_value {
            if bill.subtotal < min_order {
                return Err(Rejection::MinOrderNotMet {
                    min_order,
                    subtotal: bill.subtotal,
                }
                .into());
            }
        }

        Ok(Eligible {
            train: located.route.summary(),
            stop: located.stop,
            arrival,
            restaurant: AvailableRestaurant::new(&restaurant, self.config.default_cutoff_minutes),
            lines,
            bill,
        })
    }
}
