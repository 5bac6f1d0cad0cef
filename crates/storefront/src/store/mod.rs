//! Optimistic client-state synchronization for cart, wishlist, and addresses.
//!
//! # Architecture
//!
//! The remote state backend owns the authoritative copy of every customer
//! collection. This module keeps an in-memory replica that is always
//! immediately consistent with user intent: a mutation applies to memory
//! synchronously, the corresponding backend call runs afterwards, and the
//! outcome either confirms the change or reverts it.
//!
//! Layers, bottom up:
//!
//! - [`Collection`] - ordered, unique-by-key item sequence
//! - [`Mutation`] - tagged mutation variants, validated before dispatch
//! - [`OptimisticStore`] - synchronous begin/commit/abort state machine with
//!   operation-scoped rollback snapshots and stale-overwrite guards
//! - [`CartStore`] / [`WishlistStore`] / [`AddressStore`] - async facades
//!   pairing the state machine with a backend client, enforcing the
//!   per-identifier in-flight guard, and queueing user-facing [`Notice`]s
//! - [`SessionBinding`] / [`StoreRegistry`] - identity lifecycle: stores are
//!   constructed when an identity binds and torn down on sign-out
//!
//! # Failure discipline
//!
//! Every failed backend call triggers exactly one reversion, exactly one
//! queued notice, and no retry. Backend failures never escape this module
//! as errors; only validation rejections do.

mod addresses;
mod binding;
mod cart;
mod collection;
mod mutation;
mod notice;
mod optimistic;
mod registry;
mod wishlist;

pub use addresses::{AddressBackend, AddressStore};
pub use binding::{BindingEffect, IdentityState, SessionBinding};
pub use cart::{CartBackend, CartStore, CartSummary};
pub use collection::{Collection, StoredItem};
pub use mutation::{Mutation, MutationRejected};
pub use notice::{Notice, NoticeLevel, NoticeQueue};
pub use optimistic::{AddPolicy, OpTicket, OptimisticStore, RollbackOutcome};
pub use registry::{CustomerStores, StoreRegistry};
pub use wishlist::{ProductLookup, WishlistBackend, WishlistStore};
