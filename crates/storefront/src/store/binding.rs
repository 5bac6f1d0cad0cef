//! Identity lifecycle state machine.
//!
//! Tracks the authenticated-identity state for one browser session and
//! decides which store effects each observed transition requires. The
//! effects are applied by the caller (the auth routes via the registry);
//! this module holds no I/O.
//!
//! Stale-fetch protection is layered: the machine serializes transitions
//! per session, and the stores themselves discard async completions from
//! older generations, so a fetch still in flight when a later transition
//! lands can never be the state observed at rest.

use medleaf_core::OwnerId;

/// Resolved identity state for a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// Identity has not been resolved yet (fresh session).
    #[default]
    Unknown,
    /// Resolved: no identity is bound.
    Anonymous,
    /// Resolved: the given identity is bound.
    SignedIn(OwnerId),
}

/// A store effect required by an identity transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingEffect {
    /// Tear down the owner's stores locally. No remote call is made.
    ClearLocal(OwnerId),
    /// Construct the owner's stores and fetch every collection wholesale.
    Populate(OwnerId),
}

/// Per-session identity binding.
#[derive(Debug, Default)]
pub struct SessionBinding {
    state: IdentityState,
}

impl SessionBinding {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: IdentityState::Unknown,
        }
    }

    /// Resume a binding from a previously persisted identity.
    #[must_use]
    pub fn resumed(owner: Option<OwnerId>) -> Self {
        Self {
            state: match owner {
                Some(owner) => IdentityState::SignedIn(owner),
                None => IdentityState::Anonymous,
            },
        }
    }

    #[must_use]
    pub const fn state(&self) -> &IdentityState {
        &self.state
    }

    /// Observe a resolved identity and return the effects to apply, in
    /// order. Re-observing the same identity is a no-op (no refetch).
    pub fn observe(&mut self, resolved: Option<OwnerId>) -> Vec<BindingEffect> {
        let effects = match (&self.state, &resolved) {
            // Same identity resolved again: nothing to do.
            (IdentityState::SignedIn(current), Some(next)) if current == next => vec![],
            (IdentityState::Anonymous | IdentityState::Unknown, None) => vec![],

            // Sign-in, possibly replacing another identity.
            (IdentityState::SignedIn(current), Some(next)) => vec![
                BindingEffect::ClearLocal(current.clone()),
                BindingEffect::Populate(next.clone()),
            ],
            (IdentityState::Anonymous | IdentityState::Unknown, Some(next)) => {
                vec![BindingEffect::Populate(next.clone())]
            }

            // Sign-out: local clear only.
            (IdentityState::SignedIn(current), None) => {
                vec![BindingEffect::ClearLocal(current.clone())]
            }
        };

        self.state = match resolved {
            Some(owner) => IdentityState::SignedIn(owner),
            None => IdentityState::Anonymous,
        };
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id)
    }

    #[test]
    fn test_unknown_to_signed_in_populates() {
        let mut binding = SessionBinding::new();
        let effects = binding.observe(Some(owner("u1")));
        assert_eq!(effects, vec![BindingEffect::Populate(owner("u1"))]);
        assert_eq!(binding.state(), &IdentityState::SignedIn(owner("u1")));
    }

    #[test]
    fn test_unknown_to_anonymous_is_noop() {
        let mut binding = SessionBinding::new();
        assert!(binding.observe(None).is_empty());
        assert_eq!(binding.state(), &IdentityState::Anonymous);
    }

    #[test]
    fn test_sign_out_clears_locally_only() {
        let mut binding = SessionBinding::resumed(Some(owner("u1")));
        let effects = binding.observe(None);
        assert_eq!(effects, vec![BindingEffect::ClearLocal(owner("u1"))]);
    }

    #[test]
    fn test_identity_switch_clears_then_populates() {
        let mut binding = SessionBinding::resumed(Some(owner("u1")));
        let effects = binding.observe(Some(owner("u2")));
        assert_eq!(
            effects,
            vec![
                BindingEffect::ClearLocal(owner("u1")),
                BindingEffect::Populate(owner("u2")),
            ]
        );
    }

    #[test]
    fn test_same_identity_does_not_refetch() {
        let mut binding = SessionBinding::resumed(Some(owner("u1")));
        assert!(binding.observe(Some(owner("u1"))).is_empty());
    }

    #[test]
    fn test_rapid_transitions_serialize() {
        // sign-out immediately followed by sign-in: the later transition's
        // effects are the ones that land last.
        let mut binding = SessionBinding::resumed(Some(owner("u1")));
        let first = binding.observe(None);
        let second = binding.observe(Some(owner("u1")));
        assert_eq!(first, vec![BindingEffect::ClearLocal(owner("u1"))]);
        assert_eq!(second, vec![BindingEffect::Populate(owner("u1"))]);
    }
}
