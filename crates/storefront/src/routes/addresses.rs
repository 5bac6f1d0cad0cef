//! Address route handlers.
//!
//! Forms submit the ten-digit subscriber number; the country prefix is
//! fixed. Phone validation happens here, before any state change or
//! network call, and surfaces as a 400 at the point of input.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medleaf_core::{Address, AddressId, AddressKind, Phone};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::OptionalCustomer;
use crate::state::AppState;

/// Address display data.
#[derive(Debug, Clone, Serialize)]
pub struct AddressView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub recipient: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id.as_str().to_owned(),
            kind: address.kind,
            recipient: address.recipient.clone(),
            phone: address.phone.as_str().to_owned(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            is_default: address.is_default,
        }
    }
}

/// Saved addresses display data.
#[derive(Debug, Serialize)]
pub struct AddressesView {
    pub addresses: Vec<AddressView>,
}

/// Address create/edit form.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    #[serde(rename = "type", default)]
    pub kind: AddressKind,
    pub recipient: String,
    /// Ten subscriber digits; the `+91` prefix is fixed.
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "India".to_string()
}

impl AddressForm {
    /// Build a domain address, validating the phone number.
    fn into_address(self, id: AddressId) -> Result<Address> {
        let phone = Phone::from_subscriber(&self.phone)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(Address {
            id,
            kind: self.kind,
            recipient: self.recipient,
            phone,
            street: self.street,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            is_default: self.is_default,
        })
    }
}

async fn view(state: &AppState, uid: &medleaf_core::OwnerId) -> AddressesView {
    let stores = state.registry().bind(uid).await;
    AddressesView {
        addresses: stores
            .addresses
            .items()
            .await
            .iter()
            .map(AddressView::from)
            .collect(),
    }
}

/// List saved addresses.
#[instrument(skip(state, customer))]
pub async fn list(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
) -> Response {
    let Some(customer) = customer else {
        return Json(AddressesView {
            addresses: Vec::new(),
        })
        .into_response();
    };
    Json(view(&state, &customer.uid).await).into_response()
}

/// Save a new address.
#[instrument(skip(state, customer, form))]
pub async fn create(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Json(form): Json<AddressForm>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    let address = form.into_address(AddressId::new(Uuid::new_v4().to_string()))?;
    stores.addresses.add(address).await?;
    Ok(Json(view(&state, &customer.uid).await).into_response())
}

/// Edit an existing address.
#[instrument(skip(state, customer, form))]
pub async fn update(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Path(id): Path<String>,
    Json(form): Json<AddressForm>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    let address = form.into_address(AddressId::new(id))?;
    stores.addresses.update(address).await?;
    Ok(Json(view(&state, &customer.uid).await).into_response())
}

/// Delete an address.
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

    stores.addresses.remove(&AddressId::new(id)).await?;
    Ok(Json(view(&state, &customer.uid).await).into_response())
}

/// Mark an address as the default.
#[instrument(skip(state, customer))]
pub async fn set_default(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(customer) = customer else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let stores = state.registry().bind(&customer.uid).await;

    stores.addresses.set_default(&AddressId::new(id)).await?;
    Ok(Json(view(&state, &customer.uid).await).into_response())
}
