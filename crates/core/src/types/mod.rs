//! Core types for Medleaf.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod id;
pub mod order;
pub mod phone;
pub mod price;
pub mod wishlist;

pub use address::{Address, AddressKind};
pub use cart::CartItem;
pub use id::*;
pub use order::{Order, OrderLine, OrderStatus};
pub use phone::{Phone, PhoneError};
pub use price::{CurrencyCode, Price};
pub use wishlist::WishlistItem;
