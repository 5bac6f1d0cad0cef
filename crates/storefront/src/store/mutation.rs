//! Tagged mutation variants.
//!
//! Mutations are explicit variants validated before they touch the
//! collection or the network, never loosely-shaped payloads.

use thiserror::Error;

/// A mutation against one collection.
#[derive(Debug, Clone)]
pub enum Mutation<T> {
    /// Insert an item, or (cart only) merge `quantity` into an existing
    /// line with the same identifier.
    Add { item: T, quantity: u32 },
    /// Replace the quantity of an existing line.
    Update { id: String, quantity: u32 },
    /// Remove one item.
    Remove { id: String },
    /// Remove everything.
    Clear,
}

impl<T> Mutation<T> {
    /// Validate the mutation before any state change or network call.
    ///
    /// # Errors
    ///
    /// Returns [`MutationRejected::QuantityFloor`] for `Add`/`Update`
    /// quantities below 1.
    pub fn validate(&self) -> Result<(), MutationRejected> {
        match self {
            Self::Add { quantity, .. } | Self::Update { quantity, .. } if *quantity < 1 => {
                Err(MutationRejected::QuantityFloor {
                    quantity: *quantity,
                })
            }
            _ => Ok(()),
        }
    }
}

/// A mutation that was rejected before any state change or network call.
///
/// These surface inline at the point of input; the collection and the
/// backend are untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationRejected {
    /// Quantities below 1 are never stored.
    #[error("quantity must be at least 1 (got {quantity})")]
    QuantityFloor { quantity: u32 },

    /// The target identifier does not exist in the collection.
    #[error("no item with identifier {id}")]
    UnknownIdentifier { id: String },

    /// The collection is unique by identifier and already holds this one.
    #[error("item {id} is already present")]
    Duplicate { id: String },

    /// A remote call for this identifier is still unresolved.
    #[error("a pending change for {id} is still syncing")]
    InFlight { id: String },

    /// A collection-wide operation is still unresolved.
    #[error("the collection is still syncing a previous change")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity_floor() {
        let update: Mutation<()> = Mutation::Update {
            id: "a".to_string(),
            quantity: 0,
        };
        assert_eq!(
            update.validate(),
            Err(MutationRejected::QuantityFloor { quantity: 0 })
        );

        let add = Mutation::Add {
            item: (),
            quantity: 0,
        };
        assert!(add.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_positive_quantities() {
        let update: Mutation<()> = Mutation::Update {
            id: "a".to_string(),
            quantity: 1,
        };
        assert!(update.validate().is_ok());

        let clear: Mutation<()> = Mutation::Clear;
        assert!(clear.validate().is_ok());
    }
}
