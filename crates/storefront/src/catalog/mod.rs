//! Product catalog GraphQL client.
//!
//! The catalog service exposes a read-only GraphQL API for product data.
//! Queries are plain `{query, variables}` POSTs with typed responses;
//! listing and detail results are cached for five minutes via `moka`.
//!
//! # Example
//!
//! ```rust,ignore
//! use medleaf_storefront::catalog::CatalogClient;
//!
//! let catalog = CatalogClient::new(&config.catalog)?;
//! let products = catalog.list_products().await?;
//! let detail = catalog.get_product(&ProductId::new("prod-1")).await?;
//! ```

mod types;

pub use types::CatalogProduct;

use std::sync::Arc;
use std::time::Duration;

use medleaf_core::{ProductId, WishlistItem};
use moka::future::Cache;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::CatalogConfig;
use crate::store::ProductLookup;

/// Cache TTL for catalog responses.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Product not found.
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, CatalogError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            return Err(CatalogError::GraphQL(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        self.data
            .ok_or_else(|| CatalogError::Parse("no data in response".to_string()))
    }
}

// =============================================================================
// Queries
// =============================================================================

const GET_PRODUCTS: &str = "\
query GetProducts {
  products {
    id
    name
    price
    originalPrice
    ingredients
    manufacturer
    imageUrl
    category
    stockQuantity
    requiresPrescription
    rating
  }
}";

const GET_PRODUCT: &str = "\
query GetProduct($id: String!) {
  product(id: $id) {
    id
    name
    price
    originalPrice
    ingredients
    manufacturer
    imageUrl
    category
    stockQuantity
    requiresPrescription
    rating
  }
}";

const GET_WISHLIST_PRODUCT: &str = "\
query GetWishlistProduct($id: String!) {
  product(id: $id) {
    id
    name
    price
    originalPrice
    requiresPrescription
    imageUrl
    manufacturer
    rating
  }
}";

#[derive(Debug, Deserialize)]
struct ProductsData {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

#[derive(Debug, Deserialize)]
struct ProductData {
    product: Option<CatalogProduct>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Cached catalog value.
#[derive(Clone)]
enum CacheValue {
    Listing(Arc<Vec<CatalogProduct>>),
    Product(Box<CatalogProduct>),
}

/// Client for the product catalog GraphQL API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    endpoint: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                endpoint: config.endpoint.clone(),
                cache,
            }),
        })
    }

    /// Execute a GraphQL query.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, CatalogError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&GraphQLRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::GraphQL(vec![format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )]));
        }

        let parsed: GraphQLResponse<T> =
            serde_json::from_str(&body).map_err(|e| CatalogError::Parse(e.to_string()))?;
        parsed.into_result()
    }

    /// Full product listing for the browse and search pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<CatalogProduct>>, CatalogError> {
        let cache_key = "products:all".to_string();

        if let Some(CacheValue::Listing(products)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product listing");
            return Ok(products);
        }

        let data: ProductsData = self.execute(GET_PRODUCTS, None).await?;
        let products = Arc::new(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Listing(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Product detail by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the catalog does not know the
    /// product, or another error if the API request fails.
    #[instrument(skip(self), fields(product = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let variables = serde_json::json!({ "id": id.as_str() });
        let data: ProductData = self.execute(GET_PRODUCT, Some(variables)).await?;

        let product = data
            .product
            .ok_or_else(|| CatalogError::NotFound(format!("product {id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Case-insensitive name/brand substring search over the listing.
    /// Feeds the search box suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fetch fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<CatalogProduct>, CatalogError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let products = self.list_products().await?;
        Ok(products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.manufacturer.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}

impl ProductLookup for CatalogClient {
    /// Hydrate a stored wishlist reference. Lookup failures are logged and
    /// reported as `None` so one dead reference never sinks a reload.
    async fn wishlist_item(&self, product: &ProductId) -> Option<WishlistItem> {
        let variables = serde_json::json!({ "id": product.as_str() });
        let data: ProductData = match self.execute(GET_WISHLIST_PRODUCT, Some(variables)).await {
            Ok(data) => data,
            Err(err) => {
                warn!(product = %product, error = %err, "wishlist product lookup failed");
                return None;
            }
        };

        data.product.map(|p| p.to_wishlist_item())
    }
}
