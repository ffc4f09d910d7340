//! Order eligibility.
//!
//! Answers "can this cart be delivered to this train at this station on this
//! date?" by combining the timetable (route lookup, running days, arrival
//! date projection) with restaurant data (hours, weekly off, holidays,
//! cut-off, minimum order) and per-item service windows.

mod config;
mod menu;
mod outcome;
mod projector;
mod resolver;
mod restaurants;
mod route;

#[cfg(test)]
mod resolver_tests;

pub use config::{EligibilityConfig, RunningDayPolicy};
pub use menu::{MenuConfig, MenuSort, filter_menu, is_served_at, sort_menu};
pub use outcome::{Eligible, OffendingItem, Rejection, RejectionClass};
pub use projector::{ProjectedStop, boarding_offset, project_arrival_date, project_route};
pub use resolver::{EligibilityRequest, LocatedStop, ResolveError, Resolver};
pub use restaurants::{
    AvailableRestaurant, Exclusion, available_restaurants, holiday_block, holiday_blocks,
    static_exclusion, to_instant,
};
pub use route::{TrainRoute, TrainSummary, locate};
