//! Medleaf Core - Shared domain types.
//!
//! This crate provides common types used across the Medleaf components:
//! - `storefront` - Customer-facing pharmacy storefront service
//! - `integration-tests` - Cross-service tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, phone numbers, and the cart/wishlist/
//!   address/order domain model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
