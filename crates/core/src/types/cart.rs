//! Cart line item.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// One line in a customer's cart.
///
/// Uniquely keyed by `product_id` within the cart; `quantity` is always
/// at least 1 (a zero-quantity line is removed, never stored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub image_url: String,
    pub brand: String,
    /// Whether dispensing this product requires an uploaded prescription.
    pub prescription_required: bool,
}

impl CartItem {
    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::new(
            self.price.amount * Decimal::from(self.quantity),
            self.price.currency_code,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price::CurrencyCode;

    fn item(qty: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new("prod-1"),
            name: "Paracetamol 500mg".to_string(),
            price: Price::new(Decimal::new(4950, 2), CurrencyCode::INR),
            quantity: qty,
            image_url: "https://cdn.medleaf.in/p/prod-1.jpg".to_string(),
            brand: "Cipla".to_string(),
            prescription_required: false,
        }
    }

    #[test]
    fn test_line_total() {
        let line = item(3);
        assert_eq!(line.line_total().amount, Decimal::new(14850, 2));
        assert_eq!(line.line_total().to_string(), "₹148.50");
    }
}
