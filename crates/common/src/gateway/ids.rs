//! # Identities & Pass Identifier Derivation
//!
//! Fixed-width identity types and the deterministic derivation that maps
//! `(owner, network, constraint)` to the location of a pass.
//!
//! ## Canonical Derivation (account-model chain)
//!
//! ```text
//! pass_id    = SHA3-256(b"GATEPASS:pass:v1:"    || owner[32] || network[32] || constraint_be[8])
//! network_id = SHA3-256(b"GATEPASS:network:v1:" || authority[32])
//! ```
//!
//! All components are fixed width, so the concatenation is unambiguous.
//! The domain tags keep pass ids and network ids in disjoint hash domains
//! and leave room for a `v2` layout.
//!
//! ## Contract-Storage Derivation
//!
//! Contract chains address state by 32-byte storage words. There the pass
//! id is `Keccak-256(owner || network || uint256(constraint))` and network
//! ids are contract-scoped 128-bit integers carried in the low half of a
//! [`NetworkId`]. Values differ between the two schemes; each is
//! deterministic and collision-resistant on its own chain.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256, Sha3_256};
use std::fmt;
use std::str::FromStr;

use super::error::PassError;

// ════════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ════════════════════════════════════════════════════════════════════════════════

/// Domain separator for pass identifier derivation.
pub const PASS_ID_DOMAIN: &[u8] = b"GATEPASS:pass:v1:";

/// Domain separator for network identifier derivation.
pub const NETWORK_ID_DOMAIN: &[u8] = b"GATEPASS:network:v1:";

/// Discriminator allowing one owner to hold several passes in one network.
pub type Constraint = u64;

/// The constraint of an owner's primary pass in a network.
pub const DEFAULT_CONSTRAINT: Constraint = 0;

// ════════════════════════════════════════════════════════════════════════════════
// FIXED-WIDTH IDENTIFIERS
// ════════════════════════════════════════════════════════════════════════════════

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const fn from_bytes(b: [u8; 32]) -> Self {
                $name(b)
            }

            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, PassError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s).map_err(|e| {
                    PassError::Codec(format!("invalid {} hex: {}", stringify!($name), e))
                })?;
                let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    PassError::Codec(format!(
                        "{} must be 32 bytes, got {}",
                        stringify!($name),
                        bytes.len()
                    ))
                })?;
                Ok($name(arr))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.to_hex()).finish()
            }
        }

        impl FromStr for $name {
            type Err = PassError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<$name, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_id!(
    /// Authenticated 32-byte identity of an owner, gatekeeper or network authority.
    Identity
);

fixed_id!(
    /// 32-byte gatekeeper network identifier.
    NetworkId
);

fixed_id!(
    /// 32-byte pass identifier, the storage location of a pass record.
    PassId
);

impl NetworkId {
    /// Wrap a contract-scoped integer network id (big-endian, low 16 bytes).
    pub fn from_slot(slot: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&slot.to_be_bytes());
        NetworkId(bytes)
    }

    /// The contract-scoped integer id, if the high 16 bytes are zero.
    pub fn as_slot(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// CANONICAL DERIVATION
// ════════════════════════════════════════════════════════════════════════════════

/// Derive the canonical pass identifier for `(owner, network, constraint)`.
///
/// Pure and deterministic. Distinct owners or distinct constraints under
/// the same network yield distinct ids with overwhelming probability.
pub fn derive_pass_id(owner: &Identity, network: &NetworkId, constraint: Constraint) -> PassId {
    let mut hasher = Sha3_256::new();
    hasher.update(PASS_ID_DOMAIN);
    hasher.update(owner.as_bytes());
    hasher.update(network.as_bytes());
    hasher.update(constraint.to_be_bytes());
    PassId(hasher.finalize().into())
}

/// Derive the network identifier owned by `authority`.
///
/// One network per authority: a second network created by the same
/// authority lands on the same id.
pub fn derive_network_id(authority: &Identity) -> NetworkId {
    let mut hasher = Sha3_256::new();
    hasher.update(NETWORK_ID_DOMAIN);
    hasher.update(authority.as_bytes());
    NetworkId(hasher.finalize().into())
}

// ════════════════════════════════════════════════════════════════════════════════
// ADDRESSING SCHEMES
// ════════════════════════════════════════════════════════════════════════════════

/// Ledger-specific addressing behind the single derivation contract.
pub trait PassAddressing: Send + Sync {
    /// Network identifier for a network created by `authority`.
    fn network_id(&self, authority: &Identity) -> NetworkId;

    /// Location of the pass for `(owner, network, constraint)`.
    fn pass_id(&self, owner: &Identity, network: &NetworkId, constraint: Constraint) -> PassId;
}

/// Account-model addressing: the canonical SHA3-256 seed layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountAddressing;

impl PassAddressing for AccountAddressing {
    fn network_id(&self, authority: &Identity) -> NetworkId {
        derive_network_id(authority)
    }

    fn pass_id(&self, owner: &Identity, network: &NetworkId, constraint: Constraint) -> PassId {
        derive_pass_id(owner, network, constraint)
    }
}

/// Contract-storage addressing: Keccak-256 over 32-byte words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContractSlotAddressing;

impl PassAddressing for ContractSlotAddressing {
    fn network_id(&self, authority: &Identity) -> NetworkId {
        let digest: [u8; 32] = Keccak256::digest(authority.as_bytes()).into();
        let mut high = [0u8; 16];
        high.copy_from_slice(&digest[..16]);
        NetworkId::from_slot(u128::from_be_bytes(high))
    }

    fn pass_id(&self, owner: &Identity, network: &NetworkId, constraint: Constraint) -> PassId {
        let mut constraint_word = [0u8; 32];
        constraint_word[24..].copy_from_slice(&constraint.to_be_bytes());

        let mut hasher = Keccak256::new();
        hasher.update(owner.as_bytes());
        hasher.update(network.as_bytes());
        hasher.update(constraint_word);
        PassId(hasher.finalize().into())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
