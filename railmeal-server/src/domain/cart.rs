//! Carts and order drafts.
//!
//! An `OrderDraft` is everything the passenger has chosen between searching
//! for a train and placing the order. It is never persisted as-is: at commit
//! time the server re-checks eligibility and recomputes prices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::menu::ItemId;
use super::restaurant::RestaurantCode;
use super::station::StationCode;
use super::time::ClockTime;

/// A quantity of one menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// The passenger's selection. Lines with a non-positive quantity do not exist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw lines, merging duplicates and dropping empty ones.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines {
            cart.add(line.item_id, line.quantity);
        }
        cart
    }

    /// Set the quantity for an item. Zero or negative removes the line.
    pub fn set_quantity(&mut self, item_id: ItemId, quantity: i64) {
        let pos = self.lines.iter().position(|l| l.item_id == item_id);
        match (pos, quantity > 0) {
            (Some(i), true) => self.lines[i].quantity = quantity,
            (Some(i), false) => {
                self.lines.remove(i);
            }
            (None, true) => self.lines.push(CartLine { item_id, quantity }),
            (None, false) => {}
        }
    }

    /// Add to (or subtract from) the quantity for an item.
    pub fn add(&mut self, item_id: ItemId, delta: i64) {
        let current = self.quantity_of(&item_id);
        self.set_quantity(item_id, current.saturating_add(delta));
    }

    pub fn quantity_of(&self, item_id: &ItemId) -> i64 {
        self.lines
            .iter()
            .find(|l| &l.item_id == item_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines, saturating at `i64::MAX`.
    pub fn unit_count(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.quantity))
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Vec::<CartLine>::deserialize(deserializer)?;
        Ok(Cart::from_lines(lines))
    }
}

/// How the passenger pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    CashOnDelivery,
    Online,
}

/// Who receives the order, and where on the train.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerDetails {
    pub name: String,
    pub mobile: String,
    pub pnr: Option<String>,
    pub coach: Option<String>,
    pub seat: Option<String>,
}

impl PassengerDetails {
    /// Check the fields needed to hand over an order and return the mobile
    /// number in its canonical 10-digit form.
    pub fn validate(&self) -> Result<String, DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidPassenger("name is required"));
        }

        let mobile = normalize_mobile(&self.mobile)
            .ok_or(DomainError::InvalidPassenger("mobile must be a 10-digit number"))?;

        if let Some(pnr) = self.pnr.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if pnr.len() != 10 || !pnr.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DomainError::InvalidPassenger("PNR must be 10 digits"));
            }
        }

        Ok(mobile)
    }
}

/// Strip spaces, dashes and a leading +91 / 0 trunk prefix.
fn normalize_mobile(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+'))
        .collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let local = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('0') => &digits[1..],
        12 if digits.starts_with("91") => &digits[2..],
        _ => return None,
    };

    Some(local.to_string())
}

/// A client-side checkout in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Train number or name fragment as entered.
    pub train: String,
    /// Journey (boarding) date.
    pub journey_date: NaiveDate,
    #[serde(default)]
    pub boarding_station: Option<StationCode>,
    /// Delivery station.
    pub station: StationCode,
    pub restaurant: RestaurantCode,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub passenger: PassengerDetails,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    /// Arrival time the client displayed. Informational only.
    #[serde(default)]
    pub displayed_arrival: Option<ClockTime>,
    /// Platform charge the client displayed. Informational only; the server
    /// always charges its own configured amount.
    #[serde(default)]
    pub displayed_charge: Option<Decimal>,
}
