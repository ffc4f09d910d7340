//! Cart pricing.
//!
//! Prices always come from the menu as stored, never from the client. The
//! platform charge is the configured amount; a charge the client displayed
//! is only compared and logged.
//!
//! Amounts are rounded half away from zero to two decimal places and kept at
//! scale 2, so they serialize as e.g. `"250.00"`. Only `format_amount`
//! drops a trailing `.00`, for display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::info;

use crate::domain::{Cart, ItemId, MenuItem};

/// Pricing parameters.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// GST applied to the subtotal, in percent.
    pub gst_percent: Decimal,

    /// Flat platform/delivery charge per order.
    pub platform_charge: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            gst_percent: Decimal::from(5),
            platform_charge: Decimal::ZERO,
        }
    }
}

impl PricingConfig {
    pub fn with_gst_percent(mut self, percent: Decimal) -> Self {
        self.gst_percent = percent;
        self
    }

    pub fn with_platform_charge(mut self, charge: Decimal) -> Self {
        self.platform_charge = charge;
        self
    }
}

/// One cart line priced from the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl PricedLine {
    pub fn new(item: &MenuItem, quantity: i64) -> Self {
        let unit_price = round_money(item.selling_price);
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            quantity,
            unit_price,
            line_total: round_money(unit_price * Decimal::from(quantity)),
        }
    }
}

/// The amounts shown before commit and stored with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub platform_charge: Decimal,
    pub total: Decimal,
}

/// Round to two decimal places, half away from zero, at scale 2.
///
/// ```
/// use railmeal_server::pricing::round_money;
/// use rust_decimal::Decimal;
///
/// let d: Decimal = "12.345".parse().unwrap();
/// assert_eq!(round_money(d).to_string(), "12.35");
/// assert_eq!(round_money(Decimal::from(250)).to_string(), "250.00");
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Display form: two decimals, with a trailing ".00" dropped.
///
/// ```
/// use railmeal_server::pricing::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::from(250)), "250");
/// assert_eq!(format_amount("262.5".parse().unwrap()), "262.50");
/// ```
pub fn format_amount(amount: Decimal) -> String {
    let text = round_money(amount).to_string();
    match text.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

/// Price cart lines from menu items.
///
/// Returns the priced lines in cart order and the ids of cart items not
/// found in `menu`.
pub fn price_cart(cart: &Cart, menu: &[MenuItem]) -> (Vec<PricedLine>, Vec<ItemId>) {
    let mut lines = Vec::new();
    let mut missing = Vec::new();

    for line in cart.lines() {
        match menu.iter().find(|m| m.id == line.item_id) {
            Some(item) => lines.push(PricedLine::new(item, line.quantity)),
            None => missing.push(line.item_id.clone()),
        }
    }

    (lines, missing)
}

/// Sum of line totals; non-positive quantities contribute nothing.
pub fn subtotal(lines: &[PricedLine]) -> Decimal {
    round_money(
        lines
            .iter()
            .filter(|l| l.quantity > 0)
            .map(|l| l.line_total)
            .sum(),
    )
}

/// Compute the bill for priced lines.
pub fn quote(lines: &[PricedLine], config: &PricingConfig) -> Bill {
    let subtotal = subtotal(lines);
    let gst = round_money(subtotal * config.gst_percent / Decimal::ONE_HUNDRED);
    let platform_charge = round_money(config.platform_charge);

    Bill {
        subtotal,
        gst,
        platform_charge,
        total: round_money(subtotal + gst + platform_charge),
    }
}

/// Log when the client displayed a different platform charge. The bill
/// always uses the configured one.
pub fn note_displayed_charge(displayed: Option<Decimal>, bill: &Bill) {
    if let Some(displayed) = displayed {
        if round_money(displayed) != bill.platform_charge {
            info!(
                displayed = %format_amount(displayed),
                charged = %format_amount(bill.platform_charge),
                "client-displayed platform charge differs, using configured charge"
            );
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000).prop_map(|paise| Decimal::new(paise, 2))
    }

    proptest! {
        /// Rounded amounts always have exactly two decimal places.
        #[test]
        fn rounded_scale_is_two(cents in -1_000_000_000i64..1_000_000_000, scale in 0u32..6) {
            let d = Decimal::new(cents, scale);
            prop_assert_eq!(round_money(d).scale(), 2);
        }

        /// Total is the sum of its parts.
        #[test]
        fn total_is_sum_of_parts(prices in prop::collection::vec((money(), 1i64..5), 0..8), charge in money()) {
            let lines: Vec<PricedLine> = prices
                .iter()
                .map(|(price, qty)| PricedLine {
                    item_id: ItemId::new("x"),
                    name: "x".into(),
                    quantity: *qty,
                    unit_price: *price,
                    line_total: round_money(*price * Decimal::from(*qty)),
                })
                .collect();
            let config = PricingConfig::default().with_platform_charge(charge);
            let bill = quote(&lines, &config);
            prop_assert_eq!(bill.total, bill.subtotal + bill.gst + bill.platform_charge);
            prop_assert!(bill.gst <= bill.subtotal);
        }
    }
}
