//! # Pass Audit Events
//!
//! Every successful policy or lifecycle mutation appends exactly one
//! [`PassEvent`] to the ledger, inside the same transaction as the
//! mutation itself. A rejected operation appends nothing.
//!
//! ## Binary Encoding
//!
//! [`encode_pass_event`] produces a deterministic big-endian encoding
//! for external indexers:
//!
//! ```text
//! [version: u8][discriminant: u8][fields...]
//! ```
//!
//! - identifiers are raw 32 bytes
//! - integers are fixed-width big-endian
//! - strings are `[len: u32 BE][utf-8 bytes]`
//! - expiries are `[tag: u8][u64 BE]` (tag 0 never, 1 at)
//! - the timestamp is always the last field
//!
//! Discriminant bytes are assigned explicitly and never reused.

use serde::{Deserialize, Serialize};

use gatepass_common::gateway::{Expiry, FlagMask, Identity, NetworkId, PassId};

/// Encoding format version, first byte of every encoded event.
pub const EVENT_ENCODING_VERSION: u8 = 1;

const DISC_NETWORK_CREATED: u8 = 0x01;
const DISC_GATEKEEPER_ADDED: u8 = 0x02;
const DISC_GATEKEEPER_REMOVED: u8 = 0x03;
const DISC_FLAG_DEFINED: u8 = 0x04;
const DISC_REQUIRED_MASK_SET: u8 = 0x05;
const DISC_PASS_EXPIRY_SET: u8 = 0x06;
const DISC_PASS_ISSUED: u8 = 0x10;
const DISC_PASS_FROZEN: u8 = 0x11;
const DISC_PASS_UNFROZEN: u8 = 0x12;
const DISC_PASS_REVOKED: u8 = 0x13;
const DISC_EXPIRY_REFRESHED: u8 = 0x14;
const DISC_FLAGS_SET: u8 = 0x15;

// ════════════════════════════════════════════════════════════════════════════════
// PASS EVENT
// ════════════════════════════════════════════════════════════════════════════════

/// A recorded state change of a network or a pass.
///
/// Timestamps are caller-provided; nothing here reads a clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassEvent {
    NetworkCreated {
        network: NetworkId,
        authority: Identity,
        name: String,
        timestamp: u64,
    },
    GatekeeperAdded {
        network: NetworkId,
        gatekeeper: Identity,
        timestamp: u64,
    },
    GatekeeperRemoved {
        network: NetworkId,
        gatekeeper: Identity,
        timestamp: u64,
    },
    FlagDefined {
        network: NetworkId,
        index: u8,
        name: String,
        timestamp: u64,
    },
    RequiredMaskSet {
        network: NetworkId,
        mask: FlagMask,
        timestamp: u64,
    },
    PassExpirySet {
        network: NetworkId,
        secs: u64,
        timestamp: u64,
    },
    PassIssued {
        pass: PassId,
        owner: Identity,
        network: NetworkId,
        gatekeeper: Identity,
        flags: FlagMask,
        expiry: Expiry,
        timestamp: u64,
    },
    PassFrozen {
        pass: PassId,
        by: Identity,
        timestamp: u64,
    },
    PassUnfrozen {
        pass: PassId,
        by: Identity,
        timestamp: u64,
    },
    PassRevoked {
        pass: PassId,
        by: Identity,
        timestamp: u64,
    },
    ExpiryRefreshed {
        pass: PassId,
        by: Identity,
        expiry: Expiry,
        timestamp: u64,
    },
    FlagsSet {
        pass: PassId,
        by: Identity,
        flags: FlagMask,
        timestamp: u64,
    },
}

impl PassEvent {
    /// Caller-provided timestamp of the change.
    pub fn timestamp(&self) -> u64 {
        match self {
            PassEvent::NetworkCreated { timestamp, .. }
            | PassEvent::GatekeeperAdded { timestamp, .. }
            | PassEvent::GatekeeperRemoved { timestamp, .. }
            | PassEvent::FlagDefined { timestamp, .. }
            | PassEvent::RequiredMaskSet { timestamp, .. }
            | PassEvent::PassExpirySet { timestamp, .. }
            | PassEvent::PassIssued { timestamp, .. }
            | PassEvent::PassFrozen { timestamp, .. }
            | PassEvent::PassUnfrozen { timestamp, .. }
            | PassEvent::PassRevoked { timestamp, .. }
            | PassEvent::ExpiryRefreshed { timestamp, .. }
            | PassEvent::FlagsSet { timestamp, .. } => *timestamp,
        }
    }

    /// Pass the event refers to, if it is a pass event.
    pub fn pass_id(&self) -> Option<PassId> {
        match self {
            PassEvent::PassIssued { pass, .. }
            | PassEvent::PassFrozen { pass, .. }
            | PassEvent::PassUnfrozen { pass, .. }
            | PassEvent::PassRevoked { pass, .. }
            | PassEvent::ExpiryRefreshed { pass, .. }
            | PassEvent::FlagsSet { pass, .. } => Some(*pass),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ENCODING
// ════════════════════════════════════════════════════════════════════════════════

/// Deterministic binary encoding of `event`.
///
/// Same event, same bytes. No maps, no floating point, no clock.
pub fn encode_pass_event(event: &PassEvent) -> Vec<u8> {
    let mut buf = vec![EVENT_ENCODING_VERSION];

    match event {
        PassEvent::NetworkCreated {
            network,
            authority,
            name,
            timestamp,
        } => {
            buf.push(DISC_NETWORK_CREATED);
            buf.extend_from_slice(network.as_bytes());
            buf.extend_from_slice(authority.as_bytes());
            encode_string(&mut buf, name);
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::GatekeeperAdded {
            network,
            gatekeeper,
            timestamp,
        } => {
            buf.push(DISC_GATEKEEPER_ADDED);
            buf.extend_from_slice(network.as_bytes());
            buf.extend_from_slice(gatekeeper.as_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::GatekeeperRemoved {
            network,
            gatekeeper,
            timestamp,
        } => {
            buf.push(DISC_GATEKEEPER_REMOVED);
            buf.extend_from_slice(network.as_bytes());
            buf.extend_from_slice(gatekeeper.as_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::FlagDefined {
            network,
            index,
            name,
            timestamp,
        } => {
            buf.push(DISC_FLAG_DEFINED);
            buf.extend_from_slice(network.as_bytes());
            buf.push(*index);
            encode_string(&mut buf, name);
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::RequiredMaskSet {
            network,
            mask,
            timestamp,
        } => {
            buf.push(DISC_REQUIRED_MASK_SET);
            buf.extend_from_slice(network.as_bytes());
            buf.extend_from_slice(&mask.to_be_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::PassExpirySet {
            network,
            secs,
            timestamp,
        } => {
            buf.push(DISC_PASS_EXPIRY_SET);
            buf.extend_from_slice(network.as_bytes());
            buf.extend_from_slice(&secs.to_be_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::PassIssued {
            pass,
            owner,
            network,
            gatekeeper,
            flags,
            expiry,
            timestamp,
        } => {
            buf.push(DISC_PASS_ISSUED);
            buf.extend_from_slice(pass.as_bytes());
            buf.extend_from_slice(owner.as_bytes());
            buf.extend_from_slice(network.as_bytes());
            buf.extend_from_slice(gatekeeper.as_bytes());
            buf.extend_from_slice(&flags.to_be_bytes());
            encode_expiry(&mut buf, expiry);
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::PassFrozen { pass, by, timestamp } => {
            buf.push(DISC_PASS_FROZEN);
            buf.extend_from_slice(pass.as_bytes());
            buf.extend_from_slice(by.as_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::PassUnfrozen { pass, by, timestamp } => {
            buf.push(DISC_PASS_UNFROZEN);
            buf.extend_from_slice(pass.as_bytes());
            buf.extend_from_slice(by.as_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::PassRevoked { pass, by, timestamp } => {
            buf.push(DISC_PASS_REVOKED);
            buf.extend_from_slice(pass.as_bytes());
            buf.extend_from_slice(by.as_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::ExpiryRefreshed {
            pass,
            by,
            expiry,
            timestamp,
        } => {
            buf.push(DISC_EXPIRY_REFRESHED);
            buf.extend_from_slice(pass.as_bytes());
            buf.extend_from_slice(by.as_bytes());
            encode_expiry(&mut buf, expiry);
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }

        PassEvent::FlagsSet {
            pass,
            by,
            flags,
            timestamp,
        } => {
            buf.push(DISC_FLAGS_SET);
            buf.extend_from_slice(pass.as_bytes());
            buf.extend_from_slice(by.as_bytes());
            buf.extend_from_slice(&flags.to_be_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }
    }

    buf
}

/// `[len: u32 BE][bytes]`.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn encode_expiry(buf: &mut Vec<u8>, expiry: &Expiry) {
    match expiry {
        Expiry::Never => {
            buf.push(0);
            buf.extend_from_slice(&0u64.to_be_bytes());
        }
        Expiry::At(t) => {
            buf.push(1);
            buf.extend_from_slice(&t.to_be_bytes());
        }
    }
}
