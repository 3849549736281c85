//! # Gateway Pass Core
//!
//! Chain-agnostic model of gateway passes: revocable, expirable, per-owner
//! credentials attesting that an owner satisfied a gatekeeper's policy
//! within a gatekeeper network.
//!
//! ## Components
//!
//! | Type | Module | Purpose |
//! |------|--------|---------|
//! | `Identity`, `NetworkId`, `PassId` | `ids` | Fixed-width identifiers |
//! | `derive_pass_id`, `PassAddressing` | `ids` | Deterministic pass location (account + contract schemes) |
//! | `FlagMask`, `FlagCatalogue` | `flags` | 128-bit attribute bitset and append-only flag names |
//! | `PassState` | `status` | Active / Frozen / Revoked closed transition set |
//! | `GatekeeperNetwork` | `network` | Authorized gatekeepers, flags, required mask, default expiry |
//! | `PassRecord`, `Expiry` | `pass` | Stored pass state |
//! | `ValidityEvaluator`, `is_valid` | `validity` | Relying-party accept/reject verdict |
//! | `encode_pass`, `decode_pass` | `encoding` | 170-byte presentation encoding |
//! | `PassError` | `error` | Error contract for all operations |
//!
//! ## Relationship with `gatepass_chain`
//!
//! - `common` = pure model and validation logic, no storage, no clock.
//! - `chain` = ledger state, atomic transitions, queries and persistence.

pub mod encoding;
pub mod error;
pub mod flags;
pub mod ids;
pub mod network;
pub mod pass;
pub mod status;
pub mod validity;

// ════════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ════════════════════════════════════════════════════════════════════════════════

pub use encoding::{decode_pass, encode_pass, pass_hash, PASS_ENCODED_LEN};
pub use error::PassError;
pub use flags::{FlagCatalogue, FlagMask, FLAG_CAPACITY};
pub use ids::{
    derive_network_id, derive_pass_id, AccountAddressing, Constraint, ContractSlotAddressing,
    Identity, NetworkId, PassAddressing, PassId, DEFAULT_CONSTRAINT,
};
pub use network::{GatekeeperNetwork, MAX_NETWORK_NAME_LEN};
pub use pass::{Expiry, PassRecord};
pub use status::PassState;
pub use validity::{
    is_valid, ValidityEvaluator, ValidityFailure, ValidityReport, VerificationOptions,
};

#[cfg(test)]
mod tests;
