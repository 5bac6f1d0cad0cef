//! Wire types for the state backend.
//!
//! Request bodies key the owner as `userId` (camelCase); item payloads use
//! the backend's snake_case field names. Conversions to the core domain
//! types happen at this boundary so nothing else sees wire shapes.

use chrono::{DateTime, Utc};
use medleaf_core::{
    Address, AddressId, AddressKind, CartItem, CurrencyCode, Order, OrderId, OrderLine,
    OrderStatus, OwnerId, Phone, Price, ProductId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BackendError;

// =============================================================================
// Cart
// =============================================================================

/// `GET /api/cart/` response.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub items: Vec<CartItemWire>,
}

/// One cart entry on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemWire {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image_url: String,
    pub manufacturer: String,
    pub requires_prescription: bool,
}

impl From<CartItemWire> for CartItem {
    fn from(wire: CartItemWire) -> Self {
        Self {
            product_id: wire.product_id,
            name: wire.name,
            price: Price::new(wire.price, CurrencyCode::INR),
            quantity: wire.quantity.max(1),
            image_url: wire.image_url,
            brand: wire.manufacturer,
            prescription_required: wire.requires_prescription,
        }
    }
}

impl From<&CartItem> for CartItemWire {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price.amount,
            quantity: item.quantity,
            image_url: item.image_url.clone(),
            manufacturer: item.brand.clone(),
            requires_prescription: item.prescription_required,
        }
    }
}

/// `POST /api/cart/` body: create or update one entry.
#[derive(Debug, Serialize)]
pub struct UpsertCartBody {
    #[serde(rename = "userId")]
    pub user_id: OwnerId,
    pub item: CartItemWire,
}

/// `PUT /api/cart/` body: bulk partial quantity update.
#[derive(Debug, Serialize)]
pub struct UpdateCartBody {
    #[serde(rename = "userId")]
    pub user_id: OwnerId,
    pub updates: Vec<QuantityUpdate>,
}

#[derive(Debug, Serialize)]
pub struct QuantityUpdate {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

// =============================================================================
// Wishlist
// =============================================================================

/// `GET /api/wishlist/` response. The backend stores references only.
#[derive(Debug, Deserialize)]
pub struct WishlistEnvelope {
    #[serde(default)]
    pub wishlist: WishlistItems,
}

#[derive(Debug, Default, Deserialize)]
pub struct WishlistItems {
    #[serde(default)]
    pub items: Vec<WishlistRef>,
}

#[derive(Debug, Deserialize)]
pub struct WishlistRef {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
}

/// `POST /api/wishlist/` body.
#[derive(Debug, Serialize)]
pub struct WishlistPostBody {
    #[serde(rename = "userId")]
    pub user_id: OwnerId,
    #[serde(rename = "productIds")]
    pub product_ids: Vec<ProductId>,
}

/// `DELETE /api/wishlist/` body.
#[derive(Debug, Serialize)]
pub struct RemoveWishlistBody {
    #[serde(rename = "userId")]
    pub user_id: OwnerId,
    #[serde(rename = "productId")]
    pub product_id: ProductId,
}

// =============================================================================
// Addresses
// =============================================================================

/// `GET /api/addresses/` response.
#[derive(Debug, Deserialize)]
pub struct AddressEnvelope {
    #[serde(default)]
    pub addresses: Vec<AddressWire>,
}

/// One saved address on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressWire {
    pub id: AddressId,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub is_default: bool,
}

impl TryFrom<AddressWire> for Address {
    type Error = BackendError;

    fn try_from(wire: AddressWire) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&wire.phone)
            .map_err(|e| BackendError::Parse(format!("address {}: {e}", wire.id)))?;
        Ok(Self {
            id: wire.id,
            kind: wire.kind,
            recipient: wire.name,
            phone,
            street: wire.street,
            city: wire.city,
            state: wire.state,
            postal_code: wire.zip,
            country: wire.country,
            is_default: wire.is_default,
        })
    }
}

impl From<&Address> for AddressWire {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id.clone(),
            kind: address.kind,
            name: address.recipient.clone(),
            phone: address.phone.as_str().to_owned(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip: address.postal_code.clone(),
            country: address.country.clone(),
            is_default: address.is_default,
        }
    }
}

/// `POST`/`PUT /api/addresses/` body.
#[derive(Debug, Serialize)]
pub struct AddressBody {
    #[serde(rename = "userId")]
    pub user_id: OwnerId,
    pub address: AddressWire,
}

// =============================================================================
// Orders
// =============================================================================

/// `GET /api/orders/` response.
#[derive(Debug, Deserialize)]
pub struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<OrderWire>,
}

/// `POST /api/orders/` response.
#[derive(Debug, Deserialize)]
pub struct OrderEnvelope {
    pub order: OrderWire,
}

#[derive(Debug, Deserialize)]
pub struct OrderWire {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub lines: Vec<OrderLineWire>,
    pub total: Decimal,
    #[serde(rename = "addressId")]
    pub address_id: AddressId,
    #[serde(rename = "placedAt")]
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineWire {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl TryFrom<OrderWire> for Order {
    type Error = BackendError;

    fn try_from(wire: OrderWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            status: wire.status,
            lines: wire
                .lines
                .into_iter()
                .map(|line| OrderLine {
                    product_id: line.product_id,
                    name: line.name,
                    unit_price: Price::new(line.unit_price, CurrencyCode::INR),
                    quantity: line.quantity,
                })
                .collect(),
            total: Price::new(wire.total, CurrencyCode::INR),
            address_id: wire.address_id,
            placed_at: wire.placed_at,
        })
    }
}

/// One line of a `POST /api/orders/` body.
#[derive(Debug, Serialize)]
pub struct PlaceOrderLine {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// `POST /api/orders/` body.
#[derive(Debug, Serialize)]
pub struct PlaceOrderBody {
    #[serde(rename = "userId")]
    pub user_id: OwnerId,
    #[serde(rename = "addressId")]
    pub address_id: AddressId,
    pub lines: Vec<PlaceOrderLine>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_envelope_decodes_backend_payload() {
        let json = r#"{
            "items": [{
                "product_id": "prod-1",
                "name": "Paracetamol 500mg",
                "price": "49.50",
                "quantity": 2,
                "image_url": "https://cdn.medleaf.in/p/prod-1.jpg",
                "manufacturer": "Cipla",
                "requires_prescription": false
            }]
        }"#;
        let envelope: CartEnvelope = serde_json::from_str(json).unwrap();
        let item = CartItem::from(envelope.items.into_iter().next().unwrap());
        assert_eq!(item.product_id.as_str(), "prod-1");
        assert_eq!(item.brand, "Cipla");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price.amount, Decimal::new(4950, 2));
    }

    #[test]
    fn test_cart_envelope_tolerates_missing_items() {
        let envelope: CartEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.items.is_empty());
    }

    #[test]
    fn test_wishlist_envelope_nested_refs() {
        let json = r#"{"wishlist": {"items": [{"productId": "prod-7"}, {"productId": "prod-9"}]}}"#;
        let envelope: WishlistEnvelope = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = envelope
            .wishlist
            .items
            .iter()
            .map(|r| r.product_id.as_str())
            .collect();
        assert_eq!(ids, vec!["prod-7", "prod-9"]);
    }

    #[test]
    fn test_address_round_trip() {
        let wire = AddressWire {
            id: AddressId::new("addr-1"),
            kind: AddressKind::Work,
            name: "Asha Verma".to_string(),
            phone: "+919876543210".to_string(),
            street: "456 Business Park, Office 301".to_string(),
            city: "Durg".to_string(),
            state: "Chhattisgarh".to_string(),
            zip: "491001".to_string(),
            country: "India".to_string(),
            is_default: false,
        };

        let address = Address::try_from(wire.clone()).unwrap();
        assert_eq!(address.recipient, "Asha Verma");
        assert_eq!(address.postal_code, "491001");

        let back = AddressWire::from(&address);
        assert_eq!(back.phone, wire.phone);
        assert_eq!(back.zip, wire.zip);
    }

    #[test]
    fn test_address_bad_phone_is_parse_error() {
        let json = r#"{
            "id": "addr-2", "type": "home", "name": "A", "phone": "12345",
            "street": "s", "city": "c", "state": "st", "zip": "1",
            "country": "India", "is_default": false
        }"#;
        let wire: AddressWire = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Address::try_from(wire),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_body_serialization_uses_camel_case_owner_key() {
        let body = WishlistPostBody {
            user_id: OwnerId::new("uid-1"),
            product_ids: vec![ProductId::new("prod-3")],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["userId"], "uid-1");
        assert_eq!(json["productIds"][0], "prod-3");
    }
}
