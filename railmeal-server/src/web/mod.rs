//! Web layer for the rail meal ordering service.
//!
//! Provides JSON endpoints for train routes, restaurant availability, menus,
//! eligibility checks, cart quotes, drafts and order placement.

mod dto;
mod error;
mod routes;
mod state;

pub use dto::*;
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, Clock};
