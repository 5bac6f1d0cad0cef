//! Integration tests for the Medleaf storefront.
//!
//! # Running Tests
//!
//! The tests in `tests/` drive a running storefront over HTTP and are
//! `#[ignore]`d by default. They require:
//!
//! - A running `PostgreSQL` database (sessions)
//! - The storefront running (`cargo run -p medleaf-storefront`)
//! - A reachable state backend, catalog service, and identity provider
//!   (or local stand-ins)
//!
//! ```bash
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!     cargo test -p medleaf-integration-tests -- --ignored
//! ```

use reqwest::Client;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Create an HTTP client with a cookie store, so the session survives
/// across requests the way a browser's would.
///
/// # Panics
///
/// Panics if the client cannot be built; test-only code.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
