//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use medleaf_core::OwnerId;

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the signed-in customer.
/// The `uid` is the identity provider's opaque identifier and partitions
/// every remote collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub uid: OwnerId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_customer_round_trips_through_session_json() {
        let customer = CurrentCustomer {
            uid: OwnerId::new("uid-1"),
            email: "asha@example.com".to_string(),
            display_name: Some("Asha Verma".to_string()),
        };
        let json = serde_json::to_string(&customer).unwrap();
        let back: CurrentCustomer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.uid, customer.uid);
        assert_eq!(back.email, customer.email);
    }
}
