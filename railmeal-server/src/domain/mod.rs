//! Domain types for rail meal ordering.
//!
//! This module contains the core domain model types that represent
//! validated timetable, restaurant and cart data. All types enforce their
//! invariants at construction time, so code that receives these types can
//! trust their validity.

mod cart;
mod error;
mod menu;
mod restaurant;
mod running_days;
mod station;
mod time;
mod train;

pub use cart::{Cart, CartLine, OrderDraft, PassengerDetails, PaymentMode};
pub use error::DomainError;
pub use menu::{DietaryCategory, ItemId, ItemStatus, MenuItem};
pub use restaurant::{HolidayWindow, Restaurant, RestaurantCode, blocking_holiday};
pub use running_days::{RunningDays, WeeklyOff, weekday_code};
pub use station::{InvalidStationCode, StationCode};
pub use time::{
    ClockTime, MINUTES_PER_DAY, TimeError, TimeWindow, fixed_offset, in_window, parse_iso_date,
    to_minutes,
};
pub use train::{RouteStop, TrainIdentifier, TrainNumber};
