//! Rail meal ordering server.
//!
//! A web application that answers: "Can this meal be delivered to my seat
//! when my train reaches that station?", and places the order when it can.

pub mod cache;
pub mod config;
pub mod domain;
pub mod drafts;
pub mod eligibility;
pub mod orders;
pub mod pricing;
pub mod store;
pub mod web;
