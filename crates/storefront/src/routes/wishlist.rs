//! Wishlist route handlers.
//!
//! The add request carries the full hydrated product (the product page
//! already has it), so saving never waits on a catalog lookup.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medleaf_core::{CurrencyCode, Price, ProductId, WishlistItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::OptionalCustomer;
use crate::state::AppState;

/// Wishlist entry display data.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItemView {
    pub product_id: String,
    pub name: String,
    pub price: String,
    pub original_price: Option<String>,
    pub image_url: String,
    pub brand: String,
    pub rating: f64,
    pub prescription_required: bool,
    pub in_stock: bool,
}

impl From<&WishlistItem> for WishlistItemView {
    fn from(item: &WishlistItem) -> Self {
        Self {
            product_id: item.product_id.as_str().to_owned(),
            name: item.name.clone(),
            price: item.price.to_string(),
            original_price: item.original_price.map(|p| p.to_string()),
            image_url: item.image_url.clone(),
            brand: item.brand.clone(),
            rating: item.rating,
            prescription_required: item.prescription_required,
            in_stock: item.in_stock,
        }
    }
}

/// Wishlist display data.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItemView>,
}

/// Save-to-wishlist request: the full hydrated product.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub image_url: String,
    pub brand: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub prescription_required: bool,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

async fn view(state: &AppState, uid: &medleaf_core::OwnerId) -> WishlistView {
    let stores = state.registry().bind(uid).await;
    WishlistView {
        items: stores
            .wishlist
            .items()
            .await
            .iter()
            .map(WishlistItemView::from)
            .collect(),
    }
}

/// Display the wishlist.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Response {
    let Some(customer) = customer else {
        return Json(WishlistView { items: Vec::new() }).into_response();
    };
    Json(view(&state, &customer.uid).await).into_response()
}

/// Save a product to the wishlist.
#[instrument(skip(state, customer, request))]
pub async fn add(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(request): Json<AddToWishlistRequest>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    let item = WishlistItem {
        product_id: request.product_id,
        name: request.name,
        price: Price::new(request.price, CurrencyCode::INR),
        original_price: request
            .original_price
            .map(|amount| Price::new(amount, CurrencyCode::INR)),
        image_url: request.image_url,
        brand: request.brand,
        rating: request.rating,
        prescription_required: request.prescription_required,
        in_stock: request.in_stock,
    };

    stores.wishlist.add(item).await?;
    Ok(Json(view(&state, &customer.uid).await).into_response())
}

/// Remove a product from the wishlist.
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

    stores.wishlist.remove(&ProductId::new(id)).await?;
    Ok(Json(view(&state, &customer.uid).await).into_response())
}
