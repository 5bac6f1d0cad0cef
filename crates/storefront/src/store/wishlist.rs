//! Wishlist store facade.
//!
//! The backend stores bare product references; display items are hydrated
//! from the catalog on reload. `add` takes an already-hydrated item from
//! the caller (the product page has it on hand), so there is no catalog
//! lookup to race with a pending add.

use std::collections::HashSet;

use medleaf_core::{OwnerId, ProductId, WishlistItem};
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::backend::BackendError;

use super::mutation::{Mutation, MutationRejected};
use super::notice::{Notice, NoticeQueue};
use super::optimistic::{AddPolicy, OptimisticStore};

/// Wishlist operations on the state backend.
pub trait WishlistBackend: Send + Sync {
    fn fetch_refs(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<ProductId>, BackendError>> + Send;

    fn add_ref(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn remove_ref(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Resolves a stored product reference to a display item.
///
/// `None` means the catalog no longer knows the product; the reference is
/// dropped from the hydrated view (implementors log the cause).
pub trait ProductLookup: Send + Sync {
    fn wishlist_item(
        &self,
        product: &ProductId,
    ) -> impl Future<Output = Option<WishlistItem>> + Send;
}

struct WishlistInner {
    store: OptimisticStore<WishlistItem>,
    in_flight: HashSet<String>,
    notices: NoticeQueue,
}

impl WishlistInner {
    fn guard(&self, key: &str) -> Result<(), MutationRejected> {
        if self.in_flight.contains(key) {
            return Err(MutationRejected::InFlight { id: key.to_owned() });
        }
        Ok(())
    }
}

/// One customer's wishlist, synchronized against the state backend.
pub struct WishlistStore<B, C> {
    owner: OwnerId,
    backend: B,
    catalog: C,
    inner: Mutex<WishlistInner>,
}

impl<B: WishlistBackend, C: ProductLookup> WishlistStore<B, C> {
    #[must_use]
    pub fn new(owner: OwnerId, backend: B, catalog: C) -> Self {
        Self {
            owner,
            backend,
            catalog,
            inner: Mutex::new(WishlistInner {
                store: OptimisticStore::new(AddPolicy::RejectDuplicate),
                in_flight: HashSet::new(),
                notices: NoticeQueue::new(),
            }),
        }
    }

    /// Current wishlist entries, in order.
    pub async fn items(&self) -> Vec<WishlistItem> {
        self.inner.lock().await.store.snapshot()
    }

    /// Whether the product is already saved.
    pub async fn contains(&self, product: &ProductId) -> bool {
        self.inner.lock().await.store.contains(product.as_str())
    }

    /// Save a product. Applies to memory immediately; a failed backend
    /// call removes it again and queues one notice.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the product is already saved or
    /// a pending change for it is still syncing.
    #[instrument(skip(self, item), fields(owner = %self.owner, product = %item.product_id))]
    pub async fn add(&self, item: WishlistItem) -> Result<(), MutationRejected> {
        let name = item.name.clone();
        let product = item.product_id.clone();
        let key = product.as_str().to_owned();

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin(Mutation::Add { item, quantity: 1 })?;
            inner.in_flight.insert(key.clone());
            ticket
        };

        let result = self.backend.add_ref(&self.owner, &product).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "wishlist add failed, reverting");
                inner.store.abort(ticket);
                inner.notices.push(Notice::error(format!(
                    "Could not add {name} to your wishlist"
                )));
            }
        }
        Ok(())
    }

    /// Remove a saved product. A failed delete re-inserts it at its old
    /// position and queues one notice.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the product is not saved or a
    /// pending change for it is still syncing.
    #[instrument(skip(self), fields(owner = %self.owner, product = %product))]
    pub async fn remove(&self, product: &ProductId) -> Result<(), MutationRejected> {
        let key = product.as_str().to_owned();

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin(Mutation::Remove { id: key.clone() })?;
            inner.in_flight.insert(key.clone());
            ticket
        };

        let result = self.backend.remove_ref(&self.owner, product).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "wishlist remove failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not remove the product from your wishlist"));
            }
        }
        Ok(())
    }

    /// Fetch the stored references and hydrate them into display items,
    /// replacing memory wholesale. References the catalog cannot resolve
    /// are dropped. An unrecoverable fetch failure leaves the wishlist
    /// empty with one notice.
    #[instrument(skip(self), fields(owner = %self.owner))]
    pub async fn reload(&self) {
        let generation = self.inner.lock().await.store.generation();

        let refs = match self.backend.fetch_refs(&self.owner).await {
            Ok(refs) => refs,
            Err(err) => {
                warn!(error = %err, "wishlist fetch failed");
                let mut inner = self.inner.lock().await;
                if inner.store.generation() == generation {
                    inner.store.clear_all();
                    inner
                        .notices
                        .push(Notice::error("Could not load your wishlist"));
                }
                return;
            }
        };

        let mut items = Vec::with_capacity(refs.len());
        for product in &refs {
            if let Some(item) = self.catalog.wishlist_item(product).await {
                items.push(item);
            }
        }

        let mut inner = self.inner.lock().await;
        if inner.store.generation() == generation {
            inner.store.replace_all(items);
        }
    }

    /// Tear the wishlist down locally. No remote call is made.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        inner.store.clear_all();
        inner.in_flight.clear();
    }

    /// Take the queued user-facing notices.
    pub async fn drain_notices(&self) -> Vec<Notice> {
        self.inner.lock().await.notices.drain()
    }
}
