//! Saved delivery address.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::AddressId;
use super::phone::Phone;

/// Label for a saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    #[default]
    Home,
    Work,
    Other,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Home => "home",
            Self::Work => "work",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// A customer's saved delivery address.
///
/// At most one address per customer carries `is_default = true`; the
/// address store maintains that invariant on every default change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    /// Recipient full name.
    pub recipient: String,
    pub phone: Phone,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl Address {
    /// Single-line summary for order confirmations and logs.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {} - {}",
            self.street, self.city, self.state, self.postal_code
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&AddressKind::Work).unwrap(), "\"work\"");
        let kind: AddressKind = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(kind, AddressKind::Other);
    }

    #[test]
    fn test_summary() {
        let address = Address {
            id: AddressId::new("addr-1"),
            kind: AddressKind::Home,
            recipient: "Asha Verma".to_string(),
            phone: Phone::parse("+919876543210").unwrap(),
            street: "123 Main Street, Apartment 4B".to_string(),
            city: "Raipur".to_string(),
            state: "Chhattisgarh".to_string(),
            postal_code: "492001".to_string(),
            country: "India".to_string(),
            is_default: true,
        };
        assert_eq!(
            address.summary(),
            "123 Main Street, Apartment 4B, Raipur, Chhattisgarh - 492001"
        );
    }
}
