//! Address store facade.
//!
//! Maintains the single-default invariant: at most one saved address per
//! customer carries the default flag, and every default change - including
//! a failed one - leaves exactly one default standing. A failed
//! `set_default` restores the full prior flag assignment.

use std::collections::HashSet;

use medleaf_core::{Address, AddressId, OwnerId};
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::backend::BackendError;

use super::mutation::{Mutation, MutationRejected};
use super::notice::{Notice, NoticeQueue};
use super::optimistic::{AddPolicy, OptimisticStore};

/// Address operations on the state backend.
///
/// `update` carries the full address; the backend clears competing
/// default flags whenever the updated address sets one.
pub trait AddressBackend: Send + Sync {
    fn fetch(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<Address>, BackendError>> + Send;

    fn create(
        &self,
        owner: &OwnerId,
        address: &Address,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn update(
        &self,
        owner: &OwnerId,
        address: &Address,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete(
        &self,
        owner: &OwnerId,
        address: &AddressId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

struct AddressInner {
    store: OptimisticStore<Address>,
    in_flight: HashSet<String>,
    notices: NoticeQueue,
}

impl AddressInner {
    fn guard(&self, key: &str) -> Result<(), MutationRejected> {
        if self.in_flight.contains(key) {
            return Err(MutationRejected::InFlight { id: key.to_owned() });
        }
        Ok(())
    }

    /// After a confirmed create/update that set the default flag, clear
    /// the others locally. The backend already did so on its side, so the
    /// flip needs no remote call and is committed immediately.
    fn normalize_default(&mut self, id: &str) {
        if let Ok(ticket) = self.store.begin_set_default(id) {
            self.store.commit(ticket);
        }
    }
}

/// One customer's saved addresses, synchronized against the state backend.
pub struct AddressStore<B> {
    owner: OwnerId,
    backend: B,
    inner: Mutex<AddressInner>,
}

impl<B: AddressBackend> AddressStore<B> {
    #[must_use]
    pub fn new(owner: OwnerId, backend: B) -> Self {
        Self {
            owner,
            backend,
            inner: Mutex::new(AddressInner {
                store: OptimisticStore::new(AddPolicy::RejectDuplicate),
                in_flight: HashSet::new(),
                notices: NoticeQueue::new(),
            }),
        }
    }

    /// Current saved addresses, in order.
    pub async fn items(&self) -> Vec<Address> {
        self.inner.lock().await.store.snapshot()
    }

    /// The current default address, if one is set.
    pub async fn default_address(&self) -> Option<Address> {
        self.inner
            .lock()
            .await
            .store
            .items()
            .iter()
            .find(|address| address.is_default)
            .cloned()
    }

    /// Look up one address by id.
    pub async fn get(&self, id: &AddressId) -> Option<Address> {
        self.inner.lock().await.store.get(id.as_str()).cloned()
    }

    /// Save a new address. The caller supplies the identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the identifier already exists or
    /// a pending change for it is still syncing.
    #[instrument(skip(self, address), fields(owner = %self.owner, address_id = %address.id))]
    pub async fn add(&self, address: Address) -> Result<(), MutationRejected> {
        let key = address.id.as_str().to_owned();
        let wants_default = address.is_default;

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin(Mutation::Add {
                item: address.clone(),
                quantity: 1,
            })?;
            inner.in_flight.insert(key.clone());
            ticket
        };

        let result = self.backend.create(&self.owner, &address).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => {
                inner.store.commit(ticket);
                if wants_default {
                    inner.normalize_default(&key);
                }
            }
            Err(err) => {
                warn!(error = %err, "address create failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not save the address"));
            }
        }
        Ok(())
    }

    /// Edit an existing address in place.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the identifier is unknown or a
    /// pending change for it is still syncing.
    #[instrument(skip(self, address), fields(owner = %self.owner, address_id = %address.id))]
    pub async fn update(&self, address: Address) -> Result<(), MutationRejected> {
        let key = address.id.as_str().to_owned();
        let wants_default = address.is_default;

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin_replace(address.clone())?;
            inner.in_flight.insert(key.clone());
            ticket
        };

        let result = self.backend.update(&self.owner, &address).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => {
                inner.store.commit(ticket);
                if wants_default {
                    inner.normalize_default(&key);
                }
            }
            Err(err) => {
                warn!(error = %err, "address update failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not update the address"));
            }
        }
        Ok(())
    }

    /// Delete an address. A failed delete re-inserts it at its old
    /// position.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the identifier is unknown or a
    /// pending change for it is still syncing.
    #[instrument(skip(self), fields(owner = %self.owner, address_id = %id))]
    pub async fn remove(&self, id: &AddressId) -> Result<(), MutationRejected> {
        let key = id.as_str().to_owned();

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin(Mutation::Remove { id: key.clone() })?;
            inner.in_flight.insert(key.clone());
            ticket
        };

        let result = self.backend.delete(&self.owner, id).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "address delete failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not delete the address"));
            }
        }
        Ok(())
    }

    /// Mark one address as the default and every other as not.
    ///
    /// Applies the flag flip to memory immediately; a failed backend call
    /// restores the full prior flag assignment and queues one notice.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if the identifier is unknown or a
    /// pending change for it is still syncing.
    #[instrument(skip(self), fields(owner = %self.owner, address_id = %id))]
    pub async fn set_default(&self, id: &AddressId) -> Result<(), MutationRejected> {
        let key = id.as_str().to_owned();

        let (ticket, updated) = {
            let mut inner = self.inner.lock().await;
            inner.guard(&key)?;
            let ticket = inner.store.begin_set_default(&key)?;
            let updated = inner
                .store
                .get(&key)
                .cloned()
                .ok_or(MutationRejected::UnknownIdentifier { id: key.clone() })?;
            inner.in_flight.insert(key.clone());
            (ticket, updated)
        };

        let result = self.backend.update(&self.owner, &updated).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(&key);
        match result {
            Ok(()) => inner.store.commit(ticket),
            Err(err) => {
                warn!(error = %err, "set default failed, reverting");
                inner.store.abort(ticket);
                inner
                    .notices
                    .push(Notice::error("Could not change your default address"));
            }
        }
        Ok(())
    }

    /// Fetch the addresses wholesale, replacing memory. An unrecoverable
    /// fetch failure leaves the collection empty with one notice.
    #[instrument(skip(self), fields(owner = %self.owner))]
    pub async fn reload(&self) {
        let generation = self.inner.lock().await.store.generation();

        match self.backend.fetch(&self.owner).await {
            Ok(addresses) => {
                let mut inner = self.inner.lock().await;
                if inner.store.generation() == generation {
                    inner.store.replace_all(addresses);
                }
            }
            Err(err) => {
                warn!(error = %err, "address fetch failed");
                let mut inner = self.inner.lock().await;
                if inner.store.generation() == generation {
                    inner.store.clear_all();
                    inner
                        .notices
                        .push(Notice::error("Could not load your addresses"));
                }
            }
        }
    }

    /// Tear the collection down locally. No remote call is made.
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
