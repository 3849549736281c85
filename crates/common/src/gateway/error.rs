//! # Pass Error Types
//!
//! `PassError` is the single error contract for every policy, lifecycle
//! and lookup operation on gateway passes. Variants are non-overlapping:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `Unauthorized` | Caller lacks the authority the operation requires |
//! | `NotFound` | Referenced network, pass or flag is absent |
//! | `AlreadyExists` | Duplicate creation (network, pass, flag name) |
//! | `InvalidState` | Operation not permitted in the pass's current state |
//! | `InvalidFlag` | Mask references bit positions the network never defined |
//! | `CapacityExceeded` | Flag catalogue is full |
//! | `NameTooLong` | Network display name exceeds its fixed width |
//! | `Codec` | Malformed fixed-width encoding or identifier text |
//!
//! Every variant is a deterministic, logical failure: retrying the same
//! call against the same state fails identically.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::Identity;
use super::status::PassState;

// ════════════════════════════════════════════════════════════════════════════════
// PASS ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Error type for gateway pass operations.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PassError {
    /// The caller is neither the required authority nor an accepted delegate.
    #[error("unauthorized: {caller} may not {action}")]
    Unauthorized {
        /// Authenticated identity that attempted the operation.
        caller: Identity,
        /// Short operation name, e.g. `"freeze pass"`.
        action: String,
    },

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The entity being created is already present.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The pass is in a state that does not permit the operation.
    #[error("invalid state: cannot {action} a {state} pass")]
    InvalidState {
        /// State of the pass when the operation was attempted.
        state: PassState,
        /// Short operation name.
        action: String,
    },

    /// A mask references bit positions absent from the network catalogue.
    #[error("invalid flag mask {mask:#x}: undefined bits {undefined:#x}")]
    InvalidFlag {
        /// The offending mask.
        mask: u128,
        /// Bits of `mask` that are not defined.
        undefined: u128,
    },

    /// No free bit position remains in the flag catalogue.
    #[error("flag catalogue full: capacity is {capacity} flags")]
    CapacityExceeded {
        /// Width of the flag bitset.
        capacity: usize,
    },

    /// Network name longer than the fixed name width.
    #[error("network name is {len} bytes, maximum is {max}")]
    NameTooLong {
        /// Actual length in bytes.
        len: usize,
        /// Maximum permitted length in bytes.
        max: usize,
    },

    /// Bytes or text could not be decoded into a pass-domain value.
    #[error("codec error: {0}")]
    Codec(String),
}

impl PassError {
    /// Shorthand for [`PassError::Unauthorized`].
    pub fn unauthorized(caller: &Identity, action: &str) -> Self {
        PassError::Unauthorized {
            caller: *caller,
            action: action.to_string(),
        }
    }

    /// Shorthand for [`PassError::InvalidState`].
    pub fn invalid_state(state: PassState, action: &str) -> Self {
        PassError::InvalidState {
            state,
            action: action.to_string(),
        }
    }
}
