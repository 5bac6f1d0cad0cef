//! Per-customer store construction and teardown.
//!
//! The registry is the only place stores are created or destroyed: an
//! identity bind constructs the owner's store set and populates it, an
//! unbind tears it down locally. Routes reach stores through the registry
//! on the app state; there is no ambient singleton.

use std::collections::HashMap;
use std::sync::Arc;

use medleaf_core::OwnerId;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use super::addresses::{AddressBackend, AddressStore};
use super::cart::{CartBackend, CartStore};
use super::notice::Notice;
use super::wishlist::{ProductLookup, WishlistBackend, WishlistStore};

/// The three synchronized collections of one signed-in customer.
pub struct CustomerStores<B, C> {
    owner: OwnerId,
    pub cart: CartStore<B>,
    pub wishlist: WishlistStore<B, C>,
    pub addresses: AddressStore<B>,
}

impl<B, C> CustomerStores<B, C>
where
    B: CartBackend + WishlistBackend + AddressBackend + Clone,
    C: ProductLookup,
{
    fn new(owner: OwnerId, backend: B, catalog: C) -> Self {
        Self {
            cart: CartStore::new(owner.clone(), backend.clone()),
            wishlist: WishlistStore::new(owner.clone(), backend.clone(), catalog),
            addresses: AddressStore::new(owner.clone(), backend),
            owner,
        }
    }

    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Fetch all three collections wholesale.
    pub async fn reload_all(&self) {
        tokio::join!(
            self.cart.reload(),
            self.wishlist.reload(),
            self.addresses.reload(),
        );
    }

    /// Tear all three collections down locally. No remote calls.
    pub async fn teardown_all(&self) {
        self.cart.teardown().await;
        self.wishlist.teardown().await;
        self.addresses.teardown().await;
    }

    /// Take every queued notice across the three stores.
    pub async fn drain_notices(&self) -> Vec<Notice> {
        let mut notices = self.cart.drain_notices().await;
        notices.extend(self.wishlist.drain_notices().await);
        notices.extend(self.addresses.drain_notices().await);
        notices
    }
}

/// Owns the live store sets, keyed by customer identifier.
pub struct StoreRegistry<B, C> {
    backend: B,
    catalog: C,
    stores: RwLock<HashMap<OwnerId, Arc<CustomerStores<B, C>>>>,
}

impl<B, C> StoreRegistry<B, C>
where
    B: CartBackend + WishlistBackend + AddressBackend + Clone,
    C: ProductLookup + Clone,
{
    #[must_use]
    pub fn new(backend: B, catalog: C) -> Self {
        Self {
            backend,
            catalog,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// The owner's store set, if one is bound.
    pub async fn get(&self, owner: &OwnerId) -> Option<Arc<CustomerStores<B, C>>> {
        self.stores.read().await.get(owner).cloned()
    }

    /// Bind an identity: construct its store set and populate it. Binding
    /// an already-bound identity returns the existing set without a
    /// refetch, so the collection at rest is unchanged.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn bind(&self, owner: &OwnerId) -> Arc<CustomerStores<B, C>> {
        if let Some(existing) = self.get(owner).await {
            return existing;
        }

        let stores = Arc::new(CustomerStores::new(
            owner.clone(),
            self.backend.clone(),
            self.catalog.clone(),
        ));

        // Insert before fetching so concurrent binds of the same owner
        // converge on one set; the loser of the race is dropped unused.
        let stores = {
            let mut map = self.stores.write().await;
            map.entry(owner.clone()).or_insert(stores).clone()
        };

        info!("identity bound, populating stores");
        stores.reload_all().await;
        stores
    }

    /// Unbind an identity: tear its store set down locally and drop it.
    /// No remote call is made.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn unbind(&self, owner: &OwnerId) {
        let removed = self.stores.write().await.remove(owner);
        if let Some(stores) = removed {
            // Late async completions still holding the Arc resolve
            // against a torn-down generation and are discarded.
            stores.teardown_all().await;
            info!("identity unbound, stores cleared");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use medleaf_core::{
        Address, AddressId, CartItem, CurrencyCode, Price, ProductId, WishlistItem,
    };
    use rust_decimal::Decimal;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double shared across all three collections.
    #[derive(Default)]
    struct FakeBackend {
        cart_items: StdMutex<Vec<CartItem>>,
        fetches: AtomicUsize,
    }

    impl CartBackend for Arc<FakeBackend> {
        async fn fetch_cart(&self, _owner: &OwnerId) -> Result<Vec<CartItem>, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.cart_items.lock().unwrap().clone())
        }

        async fn upsert_item(&self, _owner: &OwnerId, _item: &CartItem) -> Result<(), BackendError> {
            Ok(())
        }

        async fn update_quantities(
            &self,
            _owner: &OwnerId,
            _updates: &[(ProductId, u32)],
        ) -> Result<(), BackendError> {
            Ok(())
        }

        async fn remove_item(
            &self,
            _owner: &OwnerId,
            _product: &ProductId,
        ) -> Result<(), BackendError> {
            Ok(())
        }

        async fn clear(&self, _owner: &OwnerId) -> Result<(), BackendError> {
            Ok(())
        }
    }

    impl WishlistBackend for Arc<FakeBackend> {
        async fn fetch_refs(&self, _owner: &OwnerId) -> Result<Vec<ProductId>, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn add_ref(&self, _owner: &OwnerId, _product: &ProductId) -> Result<(), BackendError> {
            Ok(())
        }

        async fn remove_ref(
            &self,
            _owner: &OwnerId,
            _product: &ProductId,
        ) -> Result<(), BackendError> {
            Ok(())
        }
    }

    impl AddressBackend for Arc<FakeBackend> {
        async fn fetch(&self, _owner: &OwnerId) -> Result<Vec<Address>, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn create(&self, _owner: &OwnerId, _address: &Address) -> Result<(), BackendError> {
            Ok(())
        }

        async fn update(&self, _owner: &OwnerId, _address: &Address) -> Result<(), BackendError> {
            Ok(())
        }

        async fn delete(&self, _owner: &OwnerId, _address: &AddressId) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeCatalog;

    impl ProductLookup for FakeCatalog {
        async fn wishlist_item(&self, product: &ProductId) -> Option<WishlistItem> {
            Some(WishlistItem {
                product_id: product.clone(),
                name: "stub".to_string(),
                price: Price::new(Decimal::new(10, 0), CurrencyCode::INR),
                original_price: None,
                image_url: String::new(),
                brand: String::new(),
                rating: 0.0,
                prescription_required: false,
                in_stock: true,
            })
        }
    }

    fn item(id: &str, qty: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::new(10, 0), CurrencyCode::INR),
            quantity: qty,
            image_url: String::new(),
            brand: String::new(),
            prescription_required: false,
        }
    }

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id)
    }

    #[tokio::test]
    async fn test_bind_populates_from_backend() {
        let backend = Arc::new(FakeBackend::default());
        *backend.cart_items.lock().unwrap() = vec![item("a", 2)];
        let registry = StoreRegistry::new(Arc::clone(&backend), FakeCatalog);

        let stores = registry.bind(&owner("u1")).await;
        assert_eq!(stores.cart.items().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rebind_does_not_refetch() {
        let backend = Arc::new(FakeBackend::default());
        let registry = StoreRegistry::new(Arc::clone(&backend), FakeCatalog);

        registry.bind(&owner("u1")).await;
        let fetches_after_first = backend.fetches.load(Ordering::SeqCst);
        registry.bind(&owner("u1")).await;
        assert_eq!(backend.fetches.load(Ordering::SeqCst), fetches_after_first);
    }

    #[tokio::test]
    async fn test_unbind_clears_without_remote_calls() {
        let backend = Arc::new(FakeBackend::default());
        *backend.cart_items.lock().unwrap() = vec![item("a", 2)];
        let registry = StoreRegistry::new(Arc::clone(&backend), FakeCatalog);

        let stores = registry.bind(&owner("u1")).await;
        let fetches_before = backend.fetches.load(Ordering::SeqCst);

        registry.unbind(&owner("u1")).await;

        assert!(registry.get(&owner("u1")).await.is_none());
        assert!(stores.cart.items().await.is_empty());
        // Teardown is local: no additional backend traffic.
        assert_eq!(backend.fetches.load(Ordering::SeqCst), fetches_before);
    }

    #[tokio::test]
    async fn test_sign_out_then_in_yields_fresh_populated_stores() {
        let backend = Arc::new(FakeBackend::default());
        *backend.cart_items.lock().unwrap() = vec![item("a", 2)];
        let registry = StoreRegistry::new(Arc::clone(&backend), FakeCatalog);

        registry.bind(&owner("u1")).await;
        registry.unbind(&owner("u1")).await;
        let stores = registry.bind(&owner("u1")).await;

        assert_eq!(stores.cart.items().await.len(), 1);
    }
}
