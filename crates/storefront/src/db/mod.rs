//! Database operations for the storefront `PostgreSQL`.
//!
//! The database holds session state only; every domain collection (cart,
//! wishlist, addresses, orders) lives in the remote state backend, and
//! product data lives in the catalog service.
//!
//! ## Tables
//!
//! - `tower_sessions.session` - created by the session store migration at
//!   startup

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
