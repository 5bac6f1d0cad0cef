//! Order history and checkout route handlers.
//!
//! Orders are a read-through collection: there is no optimistic state to
//! maintain, so backend failures here surface directly as errors rather
//! than notices.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use medleaf_core::{AddressId, Order, OrderStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::backend::PlaceOrderLine;
use crate::error::{AppError, Result};
use crate::middleware::RequireCustomer;
use crate::state::AppState;

/// Order line display data.
#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub product_id: String,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
}

/// Order display data.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineView>,
    pub total: String,
    pub address_id: String,
    pub placed_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_str().to_owned(),
            status: order.status,
            lines: order
                .lines
                .iter()
                .map(|line| OrderLineView {
                    product_id: line.product_id.as_str().to_owned(),
                    name: line.name.clone(),
                    unit_price: line.unit_price.to_string(),
                    quantity: line.quantity,
                })
                .collect(),
            total: order.total.to_string(),
            address_id: order.address_id.as_str().to_owned(),
            placed_at: order.placed_at,
        }
    }
}

/// Order history display data.
#[derive(Debug, Serialize)]
pub struct OrdersView {
    pub orders: Vec<OrderView>,
}

/// Checkout request: which saved address to ship to.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: String,
}

/// Order history for the signed-in customer.
#[instrument(skip(state, customer))]
pub async fn history(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Response> {
    let orders = state.backend().fetch_orders(&customer.uid).await?;
    Ok(Json(OrdersView {
        orders: orders.iter().map(OrderView::from).collect(),
    })
    .into_response())
}

/// Place an order from the current cart and a saved address, then clear
/// the cart.
#[instrument(skip(state, customer, request))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Json(request): Json<CheckoutRequest>,
) -> Result<Response> {
    let stores = state.registry().bind(&customer.uid).await;
    let address_id = AddressId::new(request.address_id);

    // The address must be one of the customer's saved addresses.
    if stores.addresses.get(&address_id).await.is_none() {
        return Err(AppError::NotFound(format!("address {address_id}")));
    }

    let items = stores.cart.items().await;
    if items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_string()));
    }

    let lines = items
        .iter()
        .map(|item| PlaceOrderLine {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        })
        .collect();

    let order = state
        .backend()
        .place_order(&customer.uid, &address_id, lines)
        .await?;

    // The backend consumed the cart into the order; sync the empty cart.
    // A Busy rejection here just means a line is still syncing - the next
    // reload converges.
    if let Err(rejection) = stores.cart.clear().await {
        tracing::warn!(rejection = %rejection, "cart clear after checkout deferred");
    }

    Ok(Json(OrderView::from(&order)).into_response())
}
