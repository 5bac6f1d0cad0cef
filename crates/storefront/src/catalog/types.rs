//! Catalog product types.

use medleaf_core::{CurrencyCode, Price, ProductId, WishlistItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product as the catalog reports it.
///
/// The wishlist-hydration query returns a subset of these fields, so the
/// listing-only ones are optional with defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub ingredients: Option<String>,
    pub manufacturer: String,
    pub image_url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    pub requires_prescription: bool,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl CatalogProduct {
    /// Whether the product can currently be ordered. Queries that do not
    /// report stock are treated as in stock.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity.is_none_or(|quantity| quantity > 0)
    }

    /// Convert to a hydrated wishlist entry.
    #[must_use]
    pub fn to_wishlist_item(&self) -> WishlistItem {
        WishlistItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            price: Price::new(self.price, CurrencyCode::INR),
            original_price: self
                .original_price
                .map(|amount| Price::new(amount, CurrencyCode::INR)),
            image_url: self.image_url.clone(),
            brand: self.manufacturer.clone(),
            rating: self.rating.unwrap_or(0.0),
            prescription_required: self.requires_prescription,
            in_stock: self.in_stock(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_full_listing_entry() {
        let json = r#"{
            "id": "prod-1",
            "name": "Paracetamol 500mg",
            "price": 49.5,
            "originalPrice": 60.0,
            "ingredients": "Paracetamol IP 500mg",
            "manufacturer": "Cipla",
            "imageUrl": "https://cdn.medleaf.in/p/prod-1.jpg",
            "category": "Pain Relief",
            "stockQuantity": 12,
            "requiresPrescription": false,
            "rating": 4.4
        }"#;
        let product: CatalogProduct = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "prod-1");
        assert!(product.in_stock());
        assert_eq!(product.category.as_deref(), Some("Pain Relief"));
    }

    #[test]
    fn test_decodes_wishlist_subset() {
        // The hydration query omits category, stock, and ingredients.
        let json = r#"{
            "id": "prod-2",
            "name": "Vitamin D3",
            "price": 250,
            "requiresPrescription": false,
            "imageUrl": "https://cdn.medleaf.in/p/prod-2.jpg",
            "manufacturer": "HealthVit",
            "rating": 4.1
        }"#;
        let product: CatalogProduct = serde_json::from_str(json).unwrap();
        let item = product.to_wishlist_item();
        assert!(item.in_stock);
        assert_eq!(item.brand, "HealthVit");
        assert!(item.original_price.is_none());
    }

    #[test]
    fn test_out_of_stock() {
        let json = r#"{
            "id": "prod-3",
            "name": "x",
            "price": 1,
            "manufacturer": "m",
            "imageUrl": "u",
            "stockQuantity": 0,
            "requiresPrescription": true
        }"#;
        let product: CatalogProduct = serde_json::from_str(json).unwrap();
        assert!(!product.in_stock());
        let item = product.to_wishlist_item();
        assert!(!item.in_stock);
        assert!((item.rating - 0.0).abs() < f64::EPSILON);
    }
}
