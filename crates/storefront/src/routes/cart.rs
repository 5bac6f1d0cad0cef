//! Cart route handlers.
//!
//! Every mutation response carries the synchronously-updated cart view:
//! the optimistic state is what the customer sees, before the backend
//! confirmation lands. Failed confirmations surface later through
//! `/api/notices`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medleaf_core::{CartItem, CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::OptionalCustomer;
use crate::state::AppState;
use crate::store::CartSummary;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: String,
    pub brand: String,
    pub prescription_required: bool,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.as_str().to_owned(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price.to_string(),
            line_price: item.line_total().to_string(),
            image_url: item.image_url.clone(),
            brand: item.brand.clone(),
            prescription_required: item.prescription_required,
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Price::zero(CurrencyCode::INR).to_string(),
            item_count: 0,
        }
    }
}

impl From<CartSummary> for CartView {
    fn from(summary: CartSummary) -> Self {
        Self {
            items: summary.items.iter().map(CartItemView::from).collect(),
            subtotal: summary.subtotal.to_string(),
            item_count: summary.item_count,
        }
    }
}

/// Cart count badge data.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub brand: String,
    #[serde(default)]
    pub prescription_required: bool,
    pub quantity: Option<u32>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// Display the cart.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Response {
    let Some(customer) = customer else {
        return Json(CartView::empty()).into_response();
    };
    let stores = state.registry().bind(&customer.uid).await;
    Json(CartView::from(stores.cart.summary().await)).into_response()
}

/// Add an item to the cart.
///
/// Anonymous visitors get a silent no-op; the UI gates the button behind
/// sign-in, so nothing here raises.
#[instrument(skip(state, customer, request))]
pub async fn add(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<AddToCartRequest>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    let quantity = request.quantity.unwrap_or(1);
    let item = CartItem {
        product_id: request.product_id,
        name: request.name,
        price: Price::new(request.price, CurrencyCode::INR),
        quantity: 1,
        image_url: request.image_url,
        brand: request.brand,
        prescription_required: request.prescription_required,
    };

    stores.cart.add(item, quantity).await?;
    Ok(Json(CartView::from(stores.cart.summary().await)).into_response())
}

/// Update a line's quantity.
#[instrument(skip(state, customer, request))]
pub async fn update(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Path(id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    stores
        .cart
        .update_quantity(&ProductId::new(id), request.quantity)
        .await?;
    Ok(Json(CartView::from(stores.cart.summary().await)).into_response())
}

/// Remove a line from the cart.
#[instrument(skip(state, customer))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    stores.cart.remove(&ProductId::new(id)).await?;
    Ok(Json(CartView::from(stores.cart.summary().await)).into_response())
}

/// Empty the cart.
#[instrument(skip(state, customer))]
pub async fn clear(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    stores.cart.clear().await?;
    Ok(Json(CartView::from(stores.cart.summary().await)).into_response())
}

/// Cart count badge.
#[instrument(skip(state, customer))]
pub async fn count(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Response {
    let count = match customer {
        Some(customer) => {
            let stores = state.registry().bind(&customer.uid).await;
            stores.cart.item_count().await
        }
        None => 0,
    };
    Json(CartCount { count }).into_response()
}
