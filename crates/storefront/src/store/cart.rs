//! Cart store facade.
//!
//! Pairs the optimistic state machine with the cart endpoints of the state
//! backend. Mutations apply to memory synchronously, the backend call runs
//! without holding the lock, and the outcome commits or reverts the change.
//! A failed call queues exactly one notice; no retry is scheduled.

use std::collections::HashSet;

use medleaf_core::{CartItem, CurrencyCode, OwnerId, Price, ProductId};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::backend::BackendError;

use super::mutation::{Mutation, MutationRejected};
use super::notice::{Notice, NoticeQueue};
use super::optimistic::{AddPolicy, OptimisticStore};

/// Cart operations on the state backend.
///
/// Implemented by the real client and by scripted doubles in tests.
pub trait CartBackend: Send + Sync {
    fn fetch_cart(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<CartItem>, BackendError>> + Send;

    fn upsert_item(
        &self,
        owner: &OwnerId,
        item: &CartItem,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn update_quantities(
        &self,
        owner: &OwnerId,
        updates: &[(ProductId, u32)],
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn remove_item(
        &self,
        owner: &OwnerId,
        product: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn clear(&self, owner: &OwnerId) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Snapshot of the cart for display.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Price,
    /// Total units across all lines.
    pub item_count: u32,
}

struct CartInner {
    store: OptimisticStore<CartItem>,
    /// Product ids with an unresolved backend call. A second mutation on
    /// one of these is rejected until the first resolves.
    in_flight: HashSet<String>,
    /// A clear is collection-wide, so it excludes everything else.
    clearing: bool,
    notices: NoticeQueue,
}

impl CartInner {
    fn guard(&self, key: &str) -> Result<(), MutationRejected> {
        if self.clearing {
            return Err(MutationRejected::Busy);
        }
        if self.in_flight.contains(key) {
            return Err(MutationRejected::InFlight { id: key.to_owned() });
        }
        Ok(())
    }
}

/// One customer's cart, synchronized against the state backend.
pub struct CartStore<B> {
    owner: OwnerId,
    backend: B,
    inner: Mutex<CartInner>,
}

impl<B: CartBackend> CartStore<B> {
    #[must_use]
    pub fn new(owner: OwnerId, backend: B) -> Self {
        Self {
            owner,
            backend,
            inner: Mutex::new(CartInner {
                store: OptimisticStore::new(AddPolicy::MergeQuantities),
                in_flight: HashSet::new(),
                clearing: false,
                notices: NoticeQueue::new(),
            }),
        }
    }

    /// Current cart lines, in order.
    pub async fn items(&self) -> Vec<CartItem> {
        self.inner.lock().await.store.snapshot()
    }

    /// Display summary: lines, subtotal, and total unit count.
    pub async fn summary(&self) -> CartSummary {
        let items = self.items().await;
        let subtotal = items
            .iter()
            .map(|item| item.line_total().amount)
            .sum::<Decimal>();
        let item_count = items.iter().map(|item| item.quantity).sum();
        CartSummary {
            items,
            subtotal: Price::new(subtotal, CurrencyCode::INR),
            item_count,
        }
    }

    /// Total unit count without cloning the lines.
    pub async fn item_count(&self) -> u32 {
        self.inner
            .lock()
            .await
            .store
            .items()
            .iter()
            .map(|item| item.quantity)
            .sum()
    }

    /// Add a product, merging quantity into an existing line.
    ///
    /// Applies to memory immediately, then confirms with the backend. On
    /// failure the merge or insert is reverted and one notice is queued.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if validation or the in-flight guard
    /// rejects the mutation before any state change.
    #[instrument(skip(self, item), fields(owner = %self.owner, product = %item.product_id))]
    pub async fn add(&self, item: CartItem, quantity: u32) -> Result<(), MutationRejected> {
        let name = item.name.clone();
        let key = item.product_id.as_str().to_owned();

        let (ticket, merged) = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin(Mutation::Add { item, quantity })?;
            // Post-merge line, so the backend sees the resulting quantity.
            let merged = inner
                .store
                .get(&key)
                .cloned()
                .ok_or(MutationRejected::UnknownIdentifier { id: key.clone() })?;
            inner.in_flight.insert(key.clone());
            (ticket, merged)
        };

        let result = self.backend.upsert_item(&self.owner, &merged).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "cart add failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error(format!("Could not add {name} to your cart")));
            }
        }
        Ok(())
    }

    /// Replace a line's quantity. Rejected below 1 before any change.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if validation or the in-flight guard
    /// rejects the mutation before any state change.
    #[instrument(skip(self), fields(owner = %self.owner, product = %product))]
    pub async fn update_quantity(
        &self,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), MutationRejected> {
        let key = product.as_str().to_owned();

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin(Mutation::Update {
                id: key.clone(),
                quantity,
            })?;
            inner.in_flight.insert(key.clone());
            ticket
        };

        let result = self
            .backend
            .update_quantities(&self.owner, &[(product.clone(), quantity)])
            .await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "cart quantity update failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not update the quantity"));
            }
        }
        Ok(())
    }

    /// Remove a line. A failed delete re-inserts it at its old position.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if validation or the in-flight guard
    /// rejects the mutation before any state change.
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

        let result = self.backend.remove_item(&self.owner, product).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "cart remove failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not remove the item from your cart"));
            }
        }
        Ok(())
    }

    /// Empty the cart. Rejected while any line is still syncing.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the in-flight guard rejects the
    /// mutation before any state change.
    #[instrument(skip(self), fields(owner = %self.owner))]
    pub async fn clear(&self) -> Result<(), MutationRejected> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            if inner.clearing || !inner.in_flight.is_empty() {
                return Err(MutationRejected::Busy);
            }
            let ticket = inner.store.begin(Mutation::Clear)?;
            inner.clearing = true;
            ticket
        };

        let result = self.backend.clear(&self.owner).await;

        let mut inner = self.inner.lock().await;
        inner.clearing = false;
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "cart clear failed, restoring");
                inner.store.abort(ticket);
                inner.notices.push(Notice::error("Could not clear your cart"));
            }
        }
        Ok(())
    }

    /// Fetch the cart wholesale, replacing memory. A fetch completing
    /// after a teardown is discarded via the generation stamp; an
    /// unrecoverable fetch failure leaves the cart empty with one notice.
    #[instrument(skip(self), fields(owner = %self.owner))]
    pub async fn reload(&self) {
        let generation = self.inner.lock().await.store.generation();

        match self.backend.fetch_cart(&self.owner).await {
            Ok(items) => {
                let mut inner = self.inner.lock().await;
                if inner.store.generation() == generation {
                    inner.store.replace_all(items);
                }
            }
            Err(err) => {
                warn!(error = %err, "cart fetch failed");
                let mut inner = self.inner.lock().await;
                if inner.store.generation() == generation {
                    inner.store.clear_all();
                    inner.notices.push(Notice::error("Could not load your cart"));
                }
            }
        }
    }

    /// Tear the cart down locally. No remote call is made.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        inner.store.clear_all();
        inner.in_flight.clear();
        inner.clearing = false;
    }

    /// Take the queued user-facing notices.
    pub async fn drain_notices(&self) -> Vec<Notice> {
        self.inner.lock().await.notices.drain()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Scripted backend double: records calls, fails when told to.
    #[derive(Default)]
    struct ScriptedBackend {
        fail_next: AtomicBool,
        calls: StdMutex<Vec<String>>,
        fetch_items: StdMutex<Vec<CartItem>>,
    }

    impl ScriptedBackend {
        fn fail_next(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }

        fn outcome(&self, call: &str) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push(call.to_owned());
            if self.fail_next.swap(false, Ordering::SeqCst) {
                Err(BackendError::Api {
                    status: 500,
                    message: "backend unavailable".to_owned(),
                })
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CartBackend for &ScriptedBackend {
        async fn fetch_cart(&self, _owner: &OwnerId) -> Result<Vec<CartItem>, BackendError> {
            self.outcome("fetch")?;
            Ok(self.fetch_items.lock().unwrap().clone())
        }

        async fn upsert_item(&self, _owner: &OwnerId, _item: &CartItem) -> Result<(), BackendError> {
            self.outcome("upsert")
        }

        async fn update_quantities(
            &self,
            _owner: &OwnerId,
            _updates: &[(ProductId, u32)],
        ) -> Result<(), BackendError> {
            self.outcome("update")
        }

        async fn remove_item(
            &self,
            _owner: &OwnerId,
            _product: &ProductId,
        ) -> Result<(), BackendError> {
            self.outcome("remove")
        }

        async fn clear(&self, _owner: &OwnerId) -> Result<(), BackendError> {
            self.outcome("clear")
        }
    }

    fn item(id: &str, qty: u32, rupees: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::new(rupees, 0), CurrencyCode::INR),
            quantity: qty,
            image_url: format!("https://cdn.medleaf.in/p/{id}.jpg"),
            brand: "Cipla".to_string(),
            prescription_required: false,
        }
    }

    fn owner() -> OwnerId {
        OwnerId::new("uid-1")
    }

    #[tokio::test]
    async fn test_add_is_visible_immediately_and_confirmed() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);

        cart.add(item("a", 1, 10), 2).await.unwrap();
        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 2);
        assert_eq!(backend.calls(), vec!["upsert"]);
        assert!(cart.drain_notices().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_add_reverts_with_one_notice() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        backend.fail_next();

        cart.add(item("a", 1, 10), 1).await.unwrap();

        assert!(cart.items().await.is_empty());
        let notices = cart.drain_notices().await;
        assert_eq!(notices.len(), 1);
        assert!(cart.drain_notices().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_restores_snapshot() {
        // [{id:"a", qty:2, price:10}] -> update to 5 -> backend fails
        // -> reverts to qty 2 with exactly one notice.
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 2).await.unwrap();

        backend.fail_next();
        cart.update_quantity(&ProductId::new("a"), 5).await.unwrap();

        let items = cart.items().await;
        assert_eq!(items.first().unwrap().quantity, 2);
        assert_eq!(cart.drain_notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_quantity_floor_rejected_without_network_call() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 2).await.unwrap();

        let result = cart.update_quantity(&ProductId::new("a"), 0).await;
        assert!(matches!(
            result,
            Err(MutationRejected::QuantityFloor { .. })
        ));
        assert_eq!(cart.items().await.first().unwrap().quantity, 2);
        // Only the add hit the backend.
        assert_eq!(backend.calls(), vec!["upsert"]);
    }

    #[tokio::test]
    async fn test_add_merges_existing_line() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);

        cart.add(item("a", 1, 10), 2).await.unwrap();
        cart.add(item("a", 1, 10), 3).await.unwrap();

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_remove_failure_reinserts_at_position() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 1).await.unwrap();
        cart.add(item("b", 1, 20), 1).await.unwrap();
        cart.add(item("c", 1, 30), 1).await.unwrap();

        backend.fail_next();
        cart.remove(&ProductId::new("b")).await.unwrap();

        let keys: Vec<String> = cart
            .items()
            .await
            .iter()
            .map(|i| i.product_id.as_str().to_owned())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(cart.drain_notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_failure_restores_everything() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 1).await.unwrap();
        cart.add(item("b", 1, 20), 2).await.unwrap();

        backend.fail_next();
        cart.clear().await.unwrap();

        assert_eq!(cart.items().await.len(), 2);
        assert_eq!(cart.item_count().await, 3);
        assert_eq!(cart.drain_notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_wholesale() {
        let backend = ScriptedBackend::default();
        *backend.fetch_items.lock().unwrap() = vec![item("x", 4, 50)];
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 1).await.unwrap();

        cart.reload().await;

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().product_id.as_str(), "x");
    }

    #[tokio::test]
    async fn test_reload_twice_is_idempotent() {
        let backend = ScriptedBackend::default();
        *backend.fetch_items.lock().unwrap() = vec![item("x", 4, 50), item("y", 1, 5)];
        let cart = CartStore::new(owner(), &backend);

        cart.reload().await;
        let first = cart.items().await;
        cart.reload().await;
        let second = cart.items().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reload_failure_clears_with_notice() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 1).await.unwrap();

        backend.fail_next();
        cart.reload().await;

        assert!(cart.items().await.is_empty());
        assert_eq!(cart.drain_notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_makes_no_remote_call() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 1).await.unwrap();
        let calls_before = backend.calls().len();

        cart.teardown().await;

        assert!(cart.items().await.is_empty());
        assert_eq!(backend.calls().len(), calls_before);
    }

    /// Backend whose mutations park on a gate until the test releases it.
    #[derive(Default)]
    struct GatedBackend {
        gate: tokio::sync::Mutex<()>,
        calls: StdMutex<Vec<String>>,
    }

    impl GatedBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CartBackend for std::sync::Arc<GatedBackend> {
        async fn fetch_cart(&self, _owner: &OwnerId) -> Result<Vec<CartItem>, BackendError> {
            Ok(Vec::new())
        }

        async fn upsert_item(&self, _owner: &OwnerId, _item: &CartItem) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push("upsert".to_owned());
            let _gate = self.gate.lock().await;
            Ok(())
        }

        async fn update_quantities(
            &self,
            _owner: &OwnerId,
            _updates: &[(ProductId, u32)],
        ) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push("update".to_owned());
            let _gate = self.gate.lock().await;
            Ok(())
        }

        async fn remove_item(
            &self,
            _owner: &OwnerId,
            _product: &ProductId,
        ) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push("remove".to_owned());
            let _gate = self.gate.lock().await;
            Ok(())
        }

        async fn clear(&self, _owner: &OwnerId) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push("clear".to_owned());
            let _gate = self.gate.lock().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_in_flight_guard_rejects_overlapping_mutation() {
        use std::sync::Arc;

        let backend = Arc::new(GatedBackend::default());
        let cart = Arc::new(CartStore::new(owner(), Arc::clone(&backend)));

        // Hold the gate so the first add parks inside its backend call.
        let gate = backend.gate.lock().await;
        let task_cart = Arc::clone(&cart);
        let task = tokio::spawn(async move { task_cart.add(item("a", 1, 10), 1).await });
        while backend.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        // The line is already visible optimistically, but a second
        // mutation on the same identifier is rejected until it resolves.
        assert_eq!(cart.items().await.len(), 1);
        let overlapping = cart.update_quantity(&ProductId::new("a"), 3).await;
        assert!(matches!(
            overlapping,
            Err(MutationRejected::InFlight { .. })
        ));

        drop(gate);
        task.await.expect("join").expect("add");
        assert_eq!(cart.items().await.first().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_clear_rejected_while_line_is_syncing() {
        use std::sync::Arc;

        let backend = Arc::new(GatedBackend::default());
        let cart = Arc::new(CartStore::new(owner(), Arc::clone(&backend)));

        let gate = backend.gate.lock().await;
        let task_cart = Arc::clone(&cart);
        let task = tokio::spawn(async move { task_cart.add(item("a", 1, 10), 1).await });
        while backend.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(cart.clear().await, Err(MutationRejected::Busy)));

        drop(gate);
        task.await.expect("join").expect("add");
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let backend = ScriptedBackend::default();
        let cart = CartStore::new(owner(), &backend);
        cart.add(item("a", 1, 10), 2).await.unwrap();
        cart.add(item("b", 1, 25), 1).await.unwrap();

        let summary = cart.summary().await;
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal.amount, Decimal::new(45, 0));
    }
}
