//! # Pass State & Lifecycle Transitions
//!
//! Every pass is in exactly one of three states. The allowed transitions
//! form a closed set:
//!
//! ```text
//! From     → To        Operation
//! ──────── ─────────── ──────────
//! Active   → Frozen    freeze
//! Frozen   → Active    unfreeze
//! Active   → Revoked   revoke
//! Frozen   → Revoked   revoke
//! ```
//!
//! `Revoked` is terminal. Self-transitions are rejected. The only way a
//! revoked identifier becomes active again is re-issuance, and only when
//! the deployment explicitly allows reissue-after-revoke; that path does
//! not go through [`PassState::can_transition_to`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::PassError;

/// Lifecycle state of a gateway pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassState {
    /// Issued and usable. The only state that can be valid.
    Active,
    /// Temporarily suspended by its gatekeeper or the network authority.
    Frozen,
    /// Permanently withdrawn. Kept as a negative record.
    Revoked,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassState::Active => write!(f, "active"),
            PassState::Frozen => write!(f, "frozen"),
            PassState::Revoked => write!(f, "revoked"),
        }
    }
}

impl PassState {
    /// Whether `self → target` is in the closed transition set.
    #[must_use]
    #[inline]
    pub const fn can_transition_to(&self, target: PassState) -> bool {
        matches!(
            (self, &target),
            (PassState::Active, PassState::Frozen)
                | (PassState::Frozen, PassState::Active)
                | (PassState::Active, PassState::Revoked)
                | (PassState::Frozen, PassState::Revoked)
        )
    }

    #[must_use]
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, PassState::Revoked)
    }

    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, PassState::Active)
    }

    /// Wire tag used by the fixed-width pass encoding.
    #[must_use]
    pub const fn to_tag(&self) -> u8 {
        match self {
            PassState::Active => 0,
            PassState::Frozen => 1,
            PassState::Revoked => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, PassError> {
        match tag {
            0 => Ok(PassState::Active),
            1 => Ok(PassState::Frozen),
            2 => Ok(PassState::Revoked),
            other => Err(PassError::Codec(format!("unknown pass state tag {}", other))),
        }
    }
}
