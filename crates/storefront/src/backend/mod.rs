//! Remote state backend client.
//!
//! The backend owns the authoritative cart, wishlist, address, and order
//! collections, partitioned by customer identifier. This client is a thin
//! `reqwest` wrapper: one method per remote operation, JSON bodies, a
//! single success-or-failure outcome per call. No retries, no caching,
//! no batching; ordering between calls is the caller's responsibility.

mod types;

pub use types::PlaceOrderLine;

use std::sync::Arc;
use std::time::Duration;

use medleaf_core::{Address, AddressId, CartItem, Order, OwnerId, ProductId};
use thiserror::Error;
use tracing::instrument;

use crate::config::StateBackendConfig;
use types::{
    AddressEnvelope, AddressWire, CartEnvelope, CartItemWire, OrderEnvelope, OrdersEnvelope,
    PlaceOrderBody, QuantityUpdate, RemoveWishlistBody, UpdateCartBody, UpsertCartBody,
    WishlistEnvelope, WishlistPostBody,
};

/// Errors that can occur when calling the state backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (transport-level).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("backend error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Client for the remote state backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new state backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StateBackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Check a response status, discarding the body on success.
    async fn check(response: reqwest::Response) -> Result<(), BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Check a response status and decode the JSON body on success.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the owner's full cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn fetch_cart_items(&self, owner: &OwnerId) -> Result<Vec<CartItem>, BackendError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/cart/"))
            .query(&[("userId", owner.as_str())])
            .send()
            .await?;

        let envelope: CartEnvelope = Self::read_json(response).await?;
        Ok(envelope.items.into_iter().map(CartItem::from).collect())
    }

    /// Create or update one cart entry with its post-merge quantity.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self, item), fields(owner = %owner, product = %item.product_id))]
    pub async fn upsert_cart_item(
        &self,
        owner: &OwnerId,
        item: &CartItem,
    ) -> Result<(), BackendError> {
        let body = UpsertCartBody {
            user_id: owner.clone(),
            item: CartItemWire::from(item),
        };
        let response = self
            .inner
            .client
            .post(self.url("/api/cart/"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Bulk partial update of line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self, updates), fields(owner = %owner))]
    pub async fn update_cart_quantities(
        &self,
        owner: &OwnerId,
        updates: &[(ProductId, u32)],
    ) -> Result<(), BackendError> {
        let body = UpdateCartBody {
            user_id: owner.clone(),
            updates: updates
                .iter()
                .map(|(product_id, quantity)| QuantityUpdate {
                    product_id: product_id.clone(),
                    quantity: *quantity,
                })
                .collect(),
        };
        let response = self
            .inner
            .client
            .put(self.url("/api/cart/"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Remove one cart entry.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self), fields(owner = %owner, product = %product))]
    pub async fn remove_cart_item(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> Result<(), BackendError> {
        let response = self
            .inner
            .client
            .delete(self.url("/api/cart/"))
            .query(&[("userId", owner.as_str()), ("productId", product.as_str())])
            .send()
            .await?;
        Self::check(response).await
    }

    /// Remove every cart entry for the owner.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn clear_cart_items(&self, owner: &OwnerId) -> Result<(), BackendError> {
        let response = self
            .inner
            .client
            .delete(self.url("/api/cart/"))
            .query(&[("userId", owner.as_str())])
            .send()
            .await?;
        Self::check(response).await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Fetch the owner's wishlist as product references.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn fetch_wishlist_refs(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<ProductId>, BackendError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/wishlist/"))
            .query(&[("userId", owner.as_str())])
            .send()
            .await?;

        let envelope: WishlistEnvelope = Self::read_json(response).await?;
        Ok(envelope
            .wishlist
            .items
            .into_iter()
            .map(|entry| entry.product_id)
            .collect())
    }

    /// Add one product reference to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self), fields(owner = %owner, product = %product))]
    pub async fn add_wishlist_ref(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> Result<(), BackendError> {
        let body = WishlistPostBody {
            user_id: owner.clone(),
            product_ids: vec![product.clone()],
        };
        let response = self
            .inner
            .client
            .post(self.url("/api/wishlist/"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Remove one product reference from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self), fields(owner = %owner, product = %product))]
    pub async fn remove_wishlist_ref(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> Result<(), BackendError> {
        let body = RemoveWishlistBody {
            user_id: owner.clone(),
            product_id: product.clone(),
        };
        let response = self
            .inner
            .client
            .delete(self.url("/api/wishlist/"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch the owner's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn fetch_addresses(&self, owner: &OwnerId) -> Result<Vec<Address>, BackendError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/addresses/"))
            .query(&[("userId", owner.as_str())])
            .send()
            .await?;

        let envelope: AddressEnvelope = Self::read_json(response).await?;
        envelope
            .addresses
            .into_iter()
            .map(Address::try_from)
            .collect()
    }

    /// Create one address. The client supplies the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self, address), fields(owner = %owner, address_id = %address.id))]
    pub async fn create_address(
        &self,
        owner: &OwnerId,
        address: &Address,
    ) -> Result<(), BackendError> {
        let body = types::AddressBody {
            user_id: owner.clone(),
            address: AddressWire::from(address),
        };
        let response = self
            .inner
            .client
            .post(self.url("/api/addresses/"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Update one address (field edits or default-flag changes). The
    /// backend clears other default flags when this one sets the default.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self, address), fields(owner = %owner, address_id = %address.id))]
    pub async fn update_address(
        &self,
        owner: &OwnerId,
        address: &Address,
    ) -> Result<(), BackendError> {
        let body = types::AddressBody {
            user_id: owner.clone(),
            address: AddressWire::from(address),
        };
        let response = self
            .inner
            .client
            .put(self.url("/api/addresses/"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Delete one address.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status.
    #[instrument(skip(self), fields(owner = %owner, address_id = %address))]
    pub async fn delete_address(
        &self,
        owner: &OwnerId,
        address: &AddressId,
    ) -> Result<(), BackendError> {
        let response = self
            .inner
            .client
            .delete(self.url("/api/addresses/"))
            .query(&[("userId", owner.as_str()), ("addressId", address.as_str())])
            .send()
            .await?;
        Self::check(response).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch the owner's order history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn fetch_orders(&self, owner: &OwnerId) -> Result<Vec<Order>, BackendError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/orders/"))
            .query(&[("userId", owner.as_str())])
            .send()
            .await?;

        let envelope: OrdersEnvelope = Self::read_json(response).await?;
        envelope.orders.into_iter().map(Order::try_from).collect()
    }

    /// Place an order from the given cart lines and delivery address.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success status or undecodable body.
    #[instrument(skip(self, lines), fields(owner = %owner, address_id = %address))]
    pub async fn place_order(
        &self,
        owner: &OwnerId,
        address: &AddressId,
        lines: Vec<PlaceOrderLine>,
    ) -> Result<Order, BackendError> {
        let body = PlaceOrderBody {
            user_id: owner.clone(),
            address_id: address.clone(),
            lines,
        };
        let response = self
            .inner
            .client
            .post(self.url("/api/orders/"))
            .json(&body)
            .send()
            .await?;

        let envelope: OrderEnvelope = Self::read_json(response).await?;
        Order::try_from(envelope.order)
    }
}

// Store backend trait wiring lives next to the facades; the impls here
// just delegate to the concrete methods above.

impl crate::store::CartBackend for BackendClient {
    fn fetch_cart(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<CartItem>, BackendError>> + Send {
        self.fetch_cart_items(owner)
    }

    fn upsert_item(
        &self,
        owner: &OwnerId,
        item: &CartItem,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.upsert_cart_item(owner, item)
    }

    fn update_quantities(
        &self,
        owner: &OwnerId,
        updates: &[(ProductId, u32)],
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.update_cart_quantities(owner, updates)
    }

    fn remove_item(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.remove_cart_item(owner, product)
    }

    fn clear(&self, owner: &OwnerId) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.clear_cart_items(owner)
    }
}

impl crate::store::WishlistBackend for BackendClient {
    fn fetch_refs(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<ProductId>, BackendError>> + Send {
        self.fetch_wishlist_refs(owner)
    }

    fn add_ref(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.add_wishlist_ref(owner, product)
    }

    fn remove_ref(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.remove_wishlist_ref(owner, product)
    }
}

impl crate::store::AddressBackend for BackendClient {
    fn fetch(&self, owner: &OwnerId) -> impl Future<Output = Result<Vec<Address>, BackendError>> + Send {
        self.fetch_addresses(owner)
    }

    fn create(
        &self,
        owner: &OwnerId,
        address: &Address,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.create_address(owner, address)
    }

    fn update(
        &self,
        owner: &OwnerId,
        address: &Address,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.update_address(owner, address)
    }

    fn delete(
        &self,
        owner: &OwnerId,
        address: &AddressId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        self.delete_address(owner, address)
    }
}
