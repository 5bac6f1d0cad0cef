//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Note the propagation boundary: backend failures during optimistic
//! mutations never reach this type - the stores convert them to reverts
//! plus notices. `AppError::Backend` only occurs on direct reads (orders,
//! checkout) where there is no optimistic state to fall back on.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::catalog::CatalogError;
use crate::identity::IdentityError;
use crate::store::MutationRejected;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// State backend read failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Catalog query failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Identity verification failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// A store mutation was rejected before any state change.
    #[error("Rejected: {0}")]
    Rejected(#[from] MutationRejected),

    /// Session layer failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if matches!(
            self,
            Self::Backend(_) | Self::Session(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Identity(err) => match err {
                IdentityError::TokenRejected(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Rejected(rejection) => match rejection {
                MutationRejected::QuantityFloor { .. } => StatusCode::BAD_REQUEST,
                MutationRejected::UnknownIdentifier { .. } => StatusCode::NOT_FOUND,
                MutationRejected::Duplicate { .. }
                | MutationRejected::InFlight { .. }
                | MutationRejected::Busy => StatusCode::CONFLICT,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(_) => "External service error".to_string(),
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => "Product not found".to_string(),
                _ => "External service error".to_string(),
            },
            Self::Identity(err) => match err {
                IdentityError::TokenRejected(_) => "Sign-in token was rejected".to_string(),
                _ => "Sign-in is temporarily unavailable".to_string(),
            },
            Self::Rejected(rejection) => rejection.to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a customer identifier.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
