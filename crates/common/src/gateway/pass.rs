//! # Pass Record
//!
//! `PassRecord` is the stored state of one gateway pass, located at the
//! identifier derived from `(owner, network, constraint)`. Re-issuance at
//! the same identifier mutates this record; a second record for the same
//! triple never exists.
//!
//! Records are never deleted. A revoked record stays in storage as a
//! permanent negative record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::PassError;
use super::flags::FlagMask;
use super::ids::{Constraint, Identity, NetworkId, PassId};
use super::status::PassState;

// ════════════════════════════════════════════════════════════════════════════════
// EXPIRY
// ════════════════════════════════════════════════════════════════════════════════

/// Pass expiry: a Unix timestamp (seconds) or never.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expiry {
    Never,
    At(u64),
}

impl Expiry {
    /// `true` once `now` has reached the expiry timestamp.
    #[must_use]
    pub const fn is_expired_at(&self, now: u64) -> bool {
        self.is_expired_with_tolerance(now, 0)
    }

    /// Like [`is_expired_at`](Self::is_expired_at) with a grace window
    /// of `tolerance_secs` after the expiry timestamp.
    #[must_use]
    pub const fn is_expired_with_tolerance(&self, now: u64, tolerance_secs: u64) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(t) => now >= (*t).saturating_add(tolerance_secs),
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> Option<u64> {
        match self {
            Expiry::Never => None,
            Expiry::At(t) => Some(*t),
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Never => write!(f, "never"),
            Expiry::At(t) => write!(f, "{}", t),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PASS RECORD
// ════════════════════════════════════════════════════════════════════════════════

/// Stored state of a gateway pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
    pub id: PassId,
    pub owner: Identity,
    pub network: NetworkId,
    pub constraint: Constraint,
    /// Gatekeeper that issued (or last re-issued) this pass.
    pub issuing_gatekeeper: Identity,
    pub state: PassState,
    pub issued_at: u64,
    pub expiry: Expiry,
    /// Attested flags, a subset of the network's defined flags when set.
    pub flags: FlagMask,
    /// Timestamp of the last mutation. Not part of the presentation encoding.
    pub last_updated: u64,
}

impl PassRecord {
    /// A freshly issued pass in [`PassState::Active`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PassId,
        owner: Identity,
        network: NetworkId,
        constraint: Constraint,
        issuing_gatekeeper: Identity,
        flags: FlagMask,
        expiry: Expiry,
        issued_at: u64,
    ) -> Self {
        PassRecord {
            id,
            owner,
            network,
            constraint,
            issuing_gatekeeper,
            state: PassState::Active,
            issued_at,
            expiry,
            flags,
            last_updated: issued_at,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// `InvalidState` if the pass is revoked.
    pub fn ensure_mutable(&self, action: &str) -> Result<(), PassError> {
        if self.is_terminal() {
            return Err(PassError::invalid_state(self.state, action));
        }
        Ok(())
    }

    /// Move to `target`, enforcing the closed transition set.
    ///
    /// On error the record is left untouched.
    pub fn transition_to(
        &mut self,
        target: PassState,
        now: u64,
        action: &str,
    ) -> Result<(), PassError> {
        if !self.state.can_transition_to(target) {
            return Err(PassError::invalid_state(self.state, action));
        }
        self.state = target;
        self.last_updated = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PassRecord {
        PassRecord::new(
            PassId([1; 32]),
            Identity([2; 32]),
            NetworkId([3; 32]),
            0,
            Identity([4; 32]),
            FlagMask(1),
            Expiry::At(1_000),
            10,
        )
    }

    #[test]
    fn test_expiry_boundaries() {
        let e = Expiry::At(100);
        assert!(!e.is_expired_at(99));
        assert!(e.is_expired_at(100));
        assert!(!e.is_expired_with_tolerance(105, 10));
        assert!(e.is_expired_with_tolerance(110, 10));
        assert!(!Expiry::Never.is_expired_at(u64::MAX));
        assert!(!Expiry::At(u64::MAX).is_expired_with_tolerance(u64::MAX - 1, 5));
    }

    #[test]
    fn test_new_record_is_active() {
        let r = record();
        assert_eq!(r.state, PassState::Active);
        assert_eq!(r.last_updated, 10);
    }

    #[test]
    fn test_transition_rejection_leaves_record() {
        let mut r = record();
        r.transition_to(PassState::Revoked, 20, "revoke").expect("revoke");
        let before = r.clone();
        let err = r.transition_to(PassState::Frozen, 30, "freeze").unwrap_err();
        assert_eq!(
            err,
            PassError::InvalidState { state: PassState::Revoked, action: "freeze".into() }
        );
        assert_eq!(r, before);
        assert!(r.ensure_mutable("refresh expiry").is_err());
    }
}
