//! Notice route handlers.
//!
//! Failed optimistic mutations queue their single user-facing notice in
//! the stores; the UI polls this endpoint and shows each notice once.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use crate::middleware::OptionalCustomer;
use crate::state::AppState;
use crate::store::Notice;

/// Drained notices.
#[derive(Debug, Serialize)]
pub struct NoticesView {
    pub notices: Vec<Notice>,
}

/// Drain the queued notices across the customer's stores.
#[instrument(skip(state, customer))]
pub async fn drain(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> impl IntoResponse {
    let notices = match customer {
        Some(customer) => match state.registry().get(&customer.uid).await {
            Some(stores) => stores.drain_notices().await,
            None => Vec::new(),
        },
        None => Vec::new(),
    };
    Json(NoticesView { notices })
}
