//! Apply-now, confirm-or-revert state machine.
//!
//! [`OptimisticStore`] applies a validated [`Mutation`] to memory
//! synchronously and hands back an [`OpTicket`]. The caller runs the
//! corresponding backend call, then resolves the ticket with
//! [`commit`](OptimisticStore::commit) or [`abort`](OptimisticStore::abort).
//!
//! Rollbacks are keyed to the ticket's own captured snapshot and are
//! applied defensively: a revert is skipped wherever a later operation
//! already changed the same identifier, and any resolution arriving after
//! a wholesale teardown (sign-out) is discarded via a generation counter.
//! A stale failure must never overwrite newer state.

use std::collections::HashMap;

use super::collection::{Collection, StoredItem};
use super::mutation::{Mutation, MutationRejected};

/// How `Add` treats an existing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPolicy {
    /// Merge the added quantity into the existing line (cart).
    MergeQuantities,
    /// Reject the add as a duplicate (wishlist, addresses).
    RejectDuplicate,
}

/// Handle for one in-flight operation.
///
/// Tickets are single-use: resolving one consumes its rollback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket {
    seq: u64,
    generation: u64,
}

/// What happened when a ticket was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The optimistic change was reverted.
    Reverted,
    /// Newer state already covered the identifier(s); nothing was touched.
    Superseded,
    /// The ticket belonged to a torn-down generation; nothing was touched.
    Stale,
}

/// Inverse of one applied mutation, captured at apply time.
#[derive(Debug, Clone)]
enum Rollback<T> {
    /// Inverse of an insert: remove the inserted item.
    RemoveInserted { key: String },
    /// Inverse of a quantity change: restore the prior quantity, but only
    /// while the item still holds the quantity this operation wrote.
    RestoreQuantity {
        key: String,
        prior: u32,
        expected: u32,
    },
    /// Inverse of a removal: re-insert the item at its old position.
    Reinsert { index: usize, item: T },
    /// Inverse of a whole-item replace: restore the prior item in place.
    RestoreItem { prior: T },
    /// Inverse of a clear: restore the full snapshot.
    RestoreAll { items: Vec<T> },
    /// Inverse of a default change: restore every default flag.
    RestoreDefaults { flags: Vec<(String, bool)> },
}

/// In-memory collection with optimistic apply and guarded rollback.
#[derive(Debug)]
pub struct OptimisticStore<T> {
    collection: Collection<T>,
    add_policy: AddPolicy,
    /// Bumped on teardown; resolutions from older generations are discarded.
    generation: u64,
    next_seq: u64,
    pending: HashMap<u64, Rollback<T>>,
    /// Sequence stamp of the last operation that touched each key.
    touched: HashMap<String, u64>,
}

impl<T: StoredItem> OptimisticStore<T> {
    #[must_use]
    pub fn new(add_policy: AddPolicy) -> Self {
        Self {
            collection: Collection::new(),
            add_policy,
            generation: 0,
            next_seq: 0,
            pending: HashMap::new(),
            touched: HashMap::new(),
        }
    }

    /// The current items, in order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        self.collection.items()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.collection.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.collection.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Generation stamp for guarding async completions. See
    /// [`replace_all`](Self::replace_all) and [`clear_all`](Self::clear_all).
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether any operation is awaiting resolution.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Validate and apply a mutation to memory, capturing its inverse.
    ///
    /// The caller must resolve the returned ticket with `commit` or
    /// `abort` once the backend call completes.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationRejected`] if validation fails; the collection
    /// is untouched.
    pub fn begin(&mut self, mutation: Mutation<T>) -> Result<OpTicket, MutationRejected> {
        mutation.validate()?;

        let seq = self.next_seq;
        let rollback = match mutation {
            Mutation::Add { mut item, quantity } => {
                let key = item.key().to_owned();
                if self.collection.contains(&key) {
                    match self.add_policy {
                        AddPolicy::RejectDuplicate => {
                            return Err(MutationRejected::Duplicate { id: key });
                        }
                        AddPolicy::MergeQuantities => {
                            let mut prior = 0;
                            let mut merged = 0;
                            self.collection.update_with(&key, |existing| {
                                prior = existing.quantity();
                                merged = prior.saturating_add(quantity);
                                existing.set_quantity(merged);
                            });
                            self.touched.insert(key.clone(), seq);
                            Rollback::RestoreQuantity {
                                key,
                                prior,
                                expected: merged,
                            }
                        }
                    }
                } else {
                    item.set_quantity(quantity);
                    self.touched.insert(key.clone(), seq);
                    let _ = self.collection.insert(item);
                    Rollback::RemoveInserted { key }
                }
            }
            Mutation::Update { id, quantity } => {
                let Some(existing) = self.collection.get(&id) else {
                    return Err(MutationRejected::UnknownIdentifier { id });
                };
                let prior = existing.quantity();
                self.collection
                    .update_with(&id, |item| item.set_quantity(quantity));
                self.touched.insert(id.clone(), seq);
                Rollback::RestoreQuantity {
                    key: id,
                    prior,
                    expected: quantity,
                }
            }
            Mutation::Remove { id } => {
                let Some((index, item)) = self.collection.remove(&id) else {
                    return Err(MutationRejected::UnknownIdentifier { id });
                };
                self.touched.insert(id, seq);
                Rollback::Reinsert { index, item }
            }
            Mutation::Clear => {
                let items = self.collection.clear();
                for item in &items {
                    self.touched.insert(item.key().to_owned(), seq);
                }
                Rollback::RestoreAll { items }
            }
        };

        self.next_seq += 1;
        self.pending.insert(seq, rollback);
        Ok(OpTicket {
            seq,
            generation: self.generation,
        })
    }

    /// Confirm an operation: the backend accepted it.
    pub fn commit(&mut self, ticket: OpTicket) {
        if ticket.generation != self.generation {
            return;
        }
        self.pending.remove(&ticket.seq);
    }

    /// Revert an operation: the backend rejected it or the call failed.
    ///
    /// Each piece of the captured snapshot is restored only where no later
    /// operation has touched the same identifier.
    pub fn abort(&mut self, ticket: OpTicket) -> RollbackOutcome {
        if ticket.generation != self.generation {
            return RollbackOutcome::Stale;
        }
        let Some(rollback) = self.pending.remove(&ticket.seq) else {
            return RollbackOutcome::Stale;
        };

        let seq = ticket.seq;
        match rollback {
            Rollback::RemoveInserted { key } => {
                if self.touched_after(&key, seq) {
                    return RollbackOutcome::Superseded;
                }
                let _ = self.collection.remove(&key);
                RollbackOutcome::Reverted
            }
            Rollback::RestoreQuantity {
                key,
                prior,
                expected,
            } => {
                if self.touched_after(&key, seq) {
                    return RollbackOutcome::Superseded;
                }
                let matches = self
                    .collection
                    .get(&key)
                    .is_some_and(|item| item.quantity() == expected);
                if !matches {
                    return RollbackOutcome::Superseded;
                }
                self.collection
                    .update_with(&key, |item| item.set_quantity(prior));
                RollbackOutcome::Reverted
            }
            Rollback::Reinsert { index, item } => {
                let key = item.key().to_owned();
                if self.touched_after(&key, seq) || self.collection.contains(&key) {
                    return RollbackOutcome::Superseded;
                }
                let _ = self.collection.insert_at(index, item);
                RollbackOutcome::Reverted
            }
            Rollback::RestoreItem { prior } => {
                let key = prior.key().to_owned();
                if self.touched_after(&key, seq) || !self.collection.contains(&key) {
                    return RollbackOutcome::Superseded;
                }
                self.collection.update_with(&key, |slot| *slot = prior);
                RollbackOutcome::Reverted
            }
            Rollback::RestoreAll { items } => {
                // A later operation re-populated something; keep it.
                if !self.collection.is_empty() {
                    return RollbackOutcome::Superseded;
                }
                self.collection.replace_all(items);
                RollbackOutcome::Reverted
            }
            Rollback::RestoreDefaults { flags } => {
                let mut reverted = false;
                for (key, prior) in flags {
                    if self.touched_after(&key, seq) {
                        continue;
                    }
                    reverted |= self
                        .collection
                        .update_with(&key, |item| item.set_default(prior));
                }
                if reverted {
                    RollbackOutcome::Reverted
                } else {
                    RollbackOutcome::Superseded
                }
            }
        }
    }

    /// Replace the whole collection with freshly fetched items.
    ///
    /// Pending operations are forgotten: their tickets resolve as stale
    /// no-ops because their snapshots no longer describe this state.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.collection.replace_all(items);
        self.pending.clear();
        self.touched.clear();
        self.generation += 1;
    }

    /// Tear the collection down (sign-out or unrecoverable fetch failure).
    /// No remote call is made here.
    pub fn clear_all(&mut self) {
        let _ = self.collection.clear();
        self.pending.clear();
        self.touched.clear();
        self.generation += 1;
    }

    /// Owned copy of the current items.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.collection.snapshot()
    }

    fn touched_after(&self, key: &str, seq: u64) -> bool {
        self.touched.get(key).is_some_and(|&stamp| stamp > seq)
    }
}

impl<T: StoredItem> OptimisticStore<T> {
    /// Replace an existing item wholesale, keeping its position, and
    /// capture the prior item for rollback.
    ///
    /// # Errors
    ///
    /// Returns [`MutationRejected::UnknownIdentifier`] if no item with the
    /// replacement's key exists.
    pub fn begin_replace(&mut self, item: T) -> Result<OpTicket, MutationRejected> {
        let key = item.key().to_owned();
        let Some(prior) = self.collection.get(&key).cloned() else {
            return Err(MutationRejected::UnknownIdentifier { id: key });
        };

        let seq = self.next_seq;
        self.collection.update_with(&key, |slot| *slot = item);
        self.touched.insert(key, seq);
        self.next_seq += 1;
        self.pending.insert(seq, Rollback::RestoreItem { prior });
        Ok(OpTicket {
            seq,
            generation: self.generation,
        })
    }

    /// Set one item's default flag true and every other's false,
    /// capturing the full prior flag assignment for rollback.
    ///
    /// Only meaningful for collections whose items carry a default flag
    /// (addresses); elsewhere the flag hooks are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`MutationRejected::UnknownIdentifier`] if the id is absent.
    pub fn begin_set_default(&mut self, id: &str) -> Result<OpTicket, MutationRejected> {
        if !self.collection.contains(id) {
            return Err(MutationRejected::UnknownIdentifier { id: id.to_owned() });
        }

        let seq = self.next_seq;
        let flags: Vec<(String, bool)> = self
            .collection
            .iter()
            .map(|item| (item.key().to_owned(), item.is_default()))
            .collect();

        let keys: Vec<String> = flags.iter().map(|(key, _)| key.clone()).collect();
        for key in &keys {
            let make_default = key == id;
            self.collection
                .update_with(key, |item| item.set_default(make_default));
            self.touched.insert(key.clone(), seq);
        }

        self.next_seq += 1;
        self.pending.insert(seq, Rollback::RestoreDefaults { flags });
        Ok(OpTicket {
            seq,
            generation: self.generation,
        })
    }
}
