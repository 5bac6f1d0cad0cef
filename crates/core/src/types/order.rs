//! Order history types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AddressId, OrderId, ProductId};
use super::price::Price;

/// Fulfillment status of a placed order, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// One product line within a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

/// A placed order in the customer's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub total: Price,
    /// Address the order ships to.
    pub address_id: AddressId,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Recompute the total from the lines. The backend's total is
    /// authoritative; this exists for display-side sanity checks.
    #[must_use]
    pub fn computed_total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.unit_price.amount * Decimal::from(line.quantity))
            .sum()
    }
}
