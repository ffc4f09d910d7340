//! Route lookup: train identifier to ordered stop list.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::{RouteStop, StationCode, TrainIdentifier, TrainNumber};
use crate::store::{DataStore, StoreError};

use super::config::RunningDayPolicy;
use super::projector::{ProjectedStop, project_route};

/// A train with its stops in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainRoute {
    pub number: TrainNumber,
    pub name: String,
    pub stops: Vec<RouteStop>,
}

/// Train display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainSummary {
    pub number: TrainNumber,
    pub name: String,
}

impl TrainRoute {
    /// Build from the stops of one or more trains, keeping only the first
    /// train. Returns `None` for an empty list.
    pub fn first_train(stops: Vec<RouteStop>) -> Option<Self> {
        let number = stops.first()?.train_number;
        let stops: Vec<RouteStop> = stops
            .into_iter()
            .filter(|s| s.train_number == number)
            .collect();
        let name = stops
            .iter()
            .map(|s| s.train_name.as_str())
            .find(|n| !n.is_empty())
            .unwrap_or_default()
            .to_string();

        Some(Self {
            number,
            name,
            stops,
        })
    }

    pub fn summary(&self) -> TrainSummary {
        TrainSummary {
            number: self.number,
            name: self.name.clone(),
        }
    }

    /// The stop at a station, if the train calls there.
    pub fn stop_at(&self, station: &StationCode) -> Option<&RouteStop> {
        self.stops.iter().find(|s| &s.station == station)
    }

    /// Stops that run on `date`.
    ///
    /// An empty result is `None` under the strict policy; under the relaxed
    /// policy the full route is kept instead.
    pub fn running_on(&self, date: NaiveDate, policy: RunningDayPolicy) -> Option<TrainRoute> {
        let running: Vec<RouteStop> = self
            .stops
            .iter()
            .filter(|s| s.running_days.runs_on(date))
            .cloned()
            .collect();

        if !running.is_empty() {
            return Some(TrainRoute {
                stops: running,
                ..self.clone()
            });
        }

        match policy {
            RunningDayPolicy::Strict => None,
            RunningDayPolicy::Relaxed => {
                debug!(train = %self.number, %date, "no stop runs on date, keeping full route");
                Some(self.clone())
            }
        }
    }

    /// Project every stop from a journey date.
    pub fn project(&self, journey_date: NaiveDate, boarding: Option<&StationCode>) -> Vec<ProjectedStop> {
        project_route(&self.stops, journey_date, boarding)
    }
}

/// Resolve a train identifier to its route.
///
/// All-digit identifiers are first looked up exactly. If that finds nothing
/// (or the identifier is text) a case-insensitive partial match on name or
/// number is tried; when several trains match, the first in store order wins.
pub async fn locate<S: DataStore>(
    store: &S,
    id: &TrainIdentifier,
) -> Result<Option<TrainRoute>, StoreError> {
    if let TrainIdentifier::Number(number) = id {
        let stops = store.route_by_number(*number).await?;
        if !stops.is_empty() {
            return Ok(TrainRoute::first_train(stops));
        }
        debug!(train = %number, "no exact match, trying partial match");
    }

    let stops = store.route_matching(&id.search_text()).await?;
    let route = TrainRoute::first_train(stops);
    if let Some(route) = &route {
        debug!(query = %id, train = %route.number, "partial match");
    }
    Ok(route)
}
