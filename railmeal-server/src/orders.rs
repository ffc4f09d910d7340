//! Order commit.
//!
//! Placing an order re-runs eligibility with the server's clock and prices
//! the cart from the menu, so nothing the client displayed is trusted. The
//! order row is the commit point; the status history row that follows is
//! best effort.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{ClockTime, DomainError, OrderDraft};
use crate::eligibility::{
    EligibilityConfig, EligibilityRequest, Eligible, Rejection, ResolveError, Resolver,
};
use crate::pricing::{PricedLine, PricingConfig, note_displayed_charge};
use crate::store::{DataStore, NewOrder, OrderId, OrderLineRow, OrderStatus, StatusEntry, StoreError};

/// Error from placing an order.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    InvalidPassenger(#[from] DomainError),

    #[error("order rejected: {}", .0.code())]
    Rejected(Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ResolveError> for OrderError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Rejected(rejection) => OrderError::Rejected(rejection),
            ResolveError::Store(e) => OrderError::Store(e),
        }
    }
}

/// A committed order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub eligible: Eligible,
}

impl From<&PricedLine> for OrderLineRow {
    fn from(line: &PricedLine) -> Self {
        Self {
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        }
    }
}

/// Validate, re-check and insert an order.
///
/// `now` is converted to the configured local offset before the cut-off
/// check.
pub async fn place_order<S: DataStore>(
    store: &S,
    eligibility: &EligibilityConfig,
    pricing: &PricingConfig,
    draft: &OrderDraft,
    now: DateTime<FixedOffset>,
) -> Result<PlacedOrder, OrderError> {
    let mobile = draft.passenger.validate()?;

    let local_now = now.with_timezone(&eligibility.local_offset());
    let eligible = Resolver::new(store, eligibility, pricing)
        .resolve(&EligibilityRequest::from(draft), local_now.naive_local())
        .await?;

    note_displayed_charge(draft.displayed_charge, &eligible.bill);
    if let Some(displayed) = draft.displayed_arrival {
        let projected = ClockTime::from(eligible.arrival.time());
        if displayed != projected {
            debug!(%displayed, %projected, "client-displayed arrival differs");
        }
    }

    let status = OrderStatus::initial_for(draft.payment_mode);
    let passenger = &draft.passenger;
    let order = NewOrder {
        train_number: eligible.train.number,
        train_name: eligible.train.name.clone(),
        journey_date: draft.journey_date,
        station_code: eligible.stop.station,
        restaurant_code: eligible.restaurant.code.clone(),
        arrival_at: eligible.arrival,
        passenger_name: passenger.name.trim().to_string(),
        passenger_mobile: mobile,
        pnr: non_blank(passenger.pnr.as_deref()),
        coach: non_blank(passenger.coach.as_deref()),
        seat: non_blank(passenger.seat.as_deref()),
        payment_mode: draft.payment_mode,
        status,
        lines: eligible.lines.iter().map(OrderLineRow::from).collect(),
        subtotal: eligible.bill.subtotal,
        gst: eligible.bill.gst,
        platform_charge: eligible.bill.platform_charge,
        total: eligible.bill.total,
        created_at: local_now,
    };

    let order_id = store.insert_order(&order).await?;
    info!(
        order = %order_id,
        train = %order.train_number,
        station = %order.station_code,
        restaurant = %order.restaurant_code,
        units = draft.cart.unit_count(),
        total = %order.total,
        status = status.as_str(),
        "order placed"
    );

    let entry = StatusEntry {
        order_id: order_id.clone(),
        status,
        note: Some("order placed".to_string()),
        changed_at: local_now,
    };
    if let Err(e) = store.insert_status(&entry).await {
        warn!(order = %order_id, error = %e, "failed to record order status history");
    }

    Ok(PlacedOrder {
        order_id,
        status,
        eligible,
    })
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
