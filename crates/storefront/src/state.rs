//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::BackendClient;
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::identity::IdentityClient;
use crate::store::StoreRegistry;

/// The store registry wired to the real clients.
pub type Registry = StoreRegistry<BackendClient, CatalogClient>;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("backend client: {0}")]
    Backend(#[from] crate::backend::BackendError),
    #[error("catalog client: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
    #[error("identity client: {0}")]
    Identity(#[from] crate::identity::IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the API clients and the store registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    catalog: CatalogClient,
    identity: IdentityClient,
    registry: Registry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the API clients fail to build.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, AppStateError> {
        let backend = BackendClient::new(&config.backend)?;
        let catalog = CatalogClient::new(&config.catalog)?;
        let identity = IdentityClient::new(&config.identity)?;
        let registry = StoreRegistry::new(backend.clone(), catalog.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                catalog,
                identity,
                registry,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the state backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the identity client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the per-customer store registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}
