//! Wishlist entry.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product saved to a customer's wishlist.
///
/// The backend stores only the product reference; these display fields are
/// hydrated from the catalog when the wishlist is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    /// Pre-discount price, when the product is on offer.
    pub original_price: Option<Price>,
    pub image_url: String,
    pub brand: String,
    /// Average customer rating, 0.0 to 5.0.
    pub rating: f64,
    pub prescription_required: bool,
    pub in_stock: bool,
}

impl WishlistItem {
    /// Discount percentage against the original price, if any.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        use rust_decimal::prelude::ToPrimitive;

        let original = self.original_price?;
        if original.amount <= self.price.amount {
            return None;
        }
        let percent = (original.amount - self.price.amount) * rust_decimal::Decimal::ONE_HUNDRED
            / original.amount;
        percent.round().to_u32()
    }
}
