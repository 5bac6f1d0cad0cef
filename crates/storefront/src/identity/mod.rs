//! Identity provider client.
//!
//! Authentication is delegated entirely to a third-party identity
//! provider: the browser signs in against the provider and hands the
//! resulting token to the storefront, which verifies it server-side and
//! receives the opaque customer identifier used to partition all remote
//! collections. No credentials are stored locally.

use std::sync::Arc;

use medleaf_core::OwnerId;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::IdentityConfig;

/// Errors that can occur when verifying a sign-in token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the token.
    #[error("token rejected: {0}")]
    TokenRejected(String),

    /// Provider returned an unexpected error response.
    #[error("provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// The verified identity behind a sign-in token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProfile {
    /// Opaque identifier partitioning the remote collections.
    pub uid: OwnerId,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user: VerifiedUser,
}

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    id: String,
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

/// Client for the identity provider's verification endpoint.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    verify_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a new identity client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(IdentityClientInner {
                client,
                verify_url: config.verify_url.clone(),
                api_key: config.api_key.expose_secret().to_owned(),
            }),
        })
    }

    /// Verify a provider-issued sign-in token.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TokenRejected`] for 401/403 responses and
    /// other variants for transport or shape failures.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<IdentityProfile, IdentityError> {
        let response = self
            .inner
            .client
            .post(&self.inner.verify_url)
            .bearer_auth(&self.inner.api_key)
            .json(&VerifyRequest { token })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::TokenRejected(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        Ok(IdentityProfile::from(verified.user))
    }
}

impl From<VerifiedUser> for IdentityProfile {
    fn from(user: VerifiedUser) -> Self {
        let display_name = match (user.first_name, user.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name),
            (None, None) => None,
        };
        Self {
            uid: OwnerId::new(user.id),
            email: user.email,
            display_name,
        }
    }
}
