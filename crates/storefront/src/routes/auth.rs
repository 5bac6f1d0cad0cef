//! Authentication route handlers.
//!
//! The browser signs in against the identity provider and posts the
//! resulting token here. Verification yields the opaque customer
//! identifier; the session binding then decides which stores to tear down
//! and which to populate, and the registry applies those effects.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalCustomer, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::state::AppState;
use crate::store::{BindingEffect, SessionBinding};

/// Sign-in request: the provider-issued token.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub token: String,
}

/// The signed-in identity as returned to the browser.
#[derive(Debug, Serialize)]
pub struct IdentityView {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<&CurrentCustomer> for IdentityView {
    fn from(customer: &CurrentCustomer) -> Self {
        Self {
            uid: customer.uid.as_str().to_owned(),
            email: customer.email.clone(),
            display_name: customer.display_name.clone(),
        }
    }
}

/// Apply binding effects against the store registry.
async fn apply_effects(state: &AppState, effects: Vec<BindingEffect>) {
    for effect in effects {
        match effect {
            BindingEffect::ClearLocal(owner) => state.registry().unbind(&owner).await,
            BindingEffect::Populate(owner) => {
                let _ = state.registry().bind(&owner).await;
            }
        }
    }
}

/// Verify a sign-in token and bind the identity's stores.
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(previous): OptionalCustomer,
    Json(request): Json<SignInRequest>,
) -> Result<impl IntoResponse> {
    let profile = state.identity().verify(&request.token).await?;

    let mut binding = SessionBinding::resumed(previous.map(|c| c.uid));
    let effects = binding.observe(Some(profile.uid.clone()));
    apply_effects(&state, effects).await;

    let customer = CurrentCustomer {
        uid: profile.uid,
        email: profile.email,
        display_name: profile.display_name,
    };
    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.uid, Some(&customer.email));

    Ok(Json(IdentityView::from(&customer)))
}

/// Sign out: clear the session and tear the stores down locally.
///
/// No remote call is made; the backend keeps the collections for the next
/// sign-in.
#[instrument(skip_all)]
pub async fn sign_out(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(previous): OptionalCustomer,
) -> Result<impl IntoResponse> {
    let mut binding = SessionBinding::resumed(previous.map(|c| c.uid));
    let effects = binding.observe(None);
    apply_effects(&state, effects).await;

    clear_current_customer(&session).await?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}

/// The current identity, if any.
#[instrument(skip_all)]
pub async fn me(OptionalCustomer(customer): OptionalCustomer) -> impl IntoResponse {
    match customer {
        Some(customer) => Json(Some(IdentityView::from(&customer))).into_response(),
        None => Json(None::<IdentityView>).into_response(),
    }
}
