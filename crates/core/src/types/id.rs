//! Newtype IDs for type-safe entity references.
//!
//! The catalog service, the state backend, and the identity provider all
//! issue opaque string identifiers. Use the `define_string_id!` macro to
//! create type-safe wrappers that prevent accidentally mixing IDs from
//! different entity types.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use medleaf_core::define_string_id;
/// define_string_id!(CustomerId);
/// define_string_id!(SkuId);
///
/// let customer = CustomerId::new("cust-81f3");
/// let sku = SkuId::new("sku-4410");
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = sku;
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Partition key issued by the identity provider; the remote backend scopes
// every collection by it.
define_string_id!(OwnerId);

define_string_id!(ProductId);
define_string_id!(AddressId);
define_string_id!(OrderId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_as_str() {
        let id = ProductId::new("prod-17");
        assert_eq!(id.as_str(), "prod-17");
        assert_eq!(id.to_string(), "prod-17");
    }

    #[test]
    fn test_serde_transparent() {
        let id = OwnerId::new("uid-abc");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"uid-abc\"");

        let back: OwnerId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_from_str_and_into_inner() {
        let id: AddressId = "addr-1".into();
        assert_eq!(id.clone().into_inner(), "addr-1");
        assert_eq!(id.as_ref(), "addr-1");
    }
}
