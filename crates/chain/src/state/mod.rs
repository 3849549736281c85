//! # Ledger State
//!
//! `LedgerState` is the full persistent state of the pass registry:
//! every network, every pass record ever issued, and the ordered audit
//! log. It is plain data; concurrency and atomicity live in
//! [`storage`].
//!
//! ## Thread Safety
//!
//! `LedgerState` is NOT thread-safe on its own. Access it through a
//! [`LedgerStorage`] implementation such as [`MemoryLedger`].

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use gatepass_common::gateway::{encode_pass, GatekeeperNetwork, NetworkId, PassId, PassRecord};

use crate::gateway::events::PassEvent;

pub mod storage;

pub use storage::{LedgerStorage, LedgerTxn, MemoryLedger};

/// Domain tag mixed into every state root.
const STATE_ROOT_DOMAIN: &[u8] = b"GATEPASS:state:v1:";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub networks: HashMap<NetworkId, GatekeeperNetwork>,
    /// Keyed by derived identifier. Records are never removed.
    pub passes: HashMap<PassId, PassRecord>,
    /// Audit log in commit order.
    pub events: Vec<PassEvent>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// SHA3-256 commitment over networks and passes, sorted by key.
    ///
    /// The event log is not committed; two ledgers holding the same
    /// records have the same root regardless of how they got there.
    pub fn compute_state_root(&self) -> Result<[u8; 32]> {
        let mut hasher = Sha3_256::new();
        hasher.update(STATE_ROOT_DOMAIN);

        let mut networks: Vec<(&NetworkId, &GatekeeperNetwork)> = self.networks.iter().collect();
        networks.sort_by_key(|&(id, _)| id);
        hasher.update((networks.len() as u64).to_be_bytes());
        for (id, network) in networks {
            let bytes = bincode::serialize(network)?;
            hasher.update(id.as_bytes());
            hasher.update(Sha3_256::digest(&bytes));
        }

        let mut passes: Vec<(&PassId, &PassRecord)> = self.passes.iter().collect();
        passes.sort_by_key(|&(id, _)| id);
        hasher.update((passes.len() as u64).to_be_bytes());
        for (id, pass) in passes {
            hasher.update(id.as_bytes());
            hasher.update(encode_pass(pass));
            hasher.update(pass.last_updated.to_be_bytes());
        }

        Ok(hasher.finalize().into())
    }
}
