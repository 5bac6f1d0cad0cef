//! Product browsing route handlers.
//!
//! All product data comes from the catalog service; responses are served
//! from the client's five-minute cache when warm.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use medleaf_core::ProductId;
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::CatalogProduct;
use crate::error::Result;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Product listing.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Response> {
    let products = state.catalog().list_products().await?;
    Ok(Json(products.as_ref().clone()).into_response())
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>> {
    let product = state.catalog().get_product(&ProductId::new(id)).await?;
    Ok(Json(product))
}

/// Search suggestions: case-insensitive name/brand substring match.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CatalogProduct>>> {
    let products = state.catalog().search_products(&params.q).await?;
    Ok(Json(products))
}
