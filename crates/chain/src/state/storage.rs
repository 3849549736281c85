//! # Ledger Storage
//!
//! The storage seam of the registry. Engines never touch a
//! [`LedgerState`] directly; they run every operation through
//! [`LedgerStorage::transact`], which gives them a [`LedgerTxn`] that
//! stages writes on top of the committed state.
//!
//! ## Atomicity
//!
//! `transact` commits all staged writes and events together when the
//! operation returns `Ok`, and discards them when it returns `Err`.
//! Reads, authority checks and writes of one operation happen under one
//! transaction, so no concurrent change can slip between check and write.
//!
//! ## Isolation
//!
//! [`MemoryLedger`] holds its write lock for the whole transaction.
//! Transactions are therefore serialized; readers see either the state
//! before or after a transaction, never a partial one.

use std::collections::HashMap;

use parking_lot::RwLock;

use gatepass_common::gateway::{GatekeeperNetwork, NetworkId, PassError, PassId, PassRecord};

use super::LedgerState;
use crate::gateway::events::PassEvent;

// ════════════════════════════════════════════════════════════════════════════════
// TRAITS
// ════════════════════════════════════════════════════════════════════════════════

/// Read-your-writes view of the ledger inside one transaction.
pub trait LedgerTxn {
    fn read_pass(&self, id: &PassId) -> Option<PassRecord>;
    fn write_pass(&mut self, record: PassRecord);
    fn read_network(&self, id: &NetworkId) -> Option<GatekeeperNetwork>;
    fn write_network(&mut self, network: GatekeeperNetwork);
    fn record_event(&mut self, event: PassEvent);
}

/// Transactional key-value store for networks and passes.
pub trait LedgerStorage: Send + Sync {
    /// Committed pass record, if any.
    fn read_pass(&self, id: &PassId) -> Option<PassRecord>;

    /// Committed network, if any.
    fn read_network(&self, id: &NetworkId) -> Option<GatekeeperNetwork>;

    /// A pass together with its network, read from one committed state.
    fn snapshot_pass(&self, id: &PassId) -> Option<(PassRecord, Option<GatekeeperNetwork>)> {
        let pass = self.read_pass(id)?;
        let network = self.read_network(&pass.network);
        Some((pass, network))
    }

    /// Committed passes matching `filter`, sorted by identifier.
    fn passes_where(&self, filter: &dyn Fn(&PassRecord) -> bool) -> Vec<PassRecord>;

    /// Number of committed audit events.
    fn event_count(&self) -> usize;

    /// Committed audit events from position `from` on, in commit order.
    /// Positions are stable since the log is append-only.
    fn events_since(&self, from: usize) -> Vec<PassEvent>;

    /// Whole committed audit log.
    fn events(&self) -> Vec<PassEvent> {
        self.events_since(0)
    }

    /// Run `op` against a staged transaction. Commit on `Ok`, discard on `Err`.
    fn transact<R, F>(&self, op: F) -> Result<R, PassError>
    where
        F: FnOnce(&mut dyn LedgerTxn) -> Result<R, PassError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// STAGED TRANSACTION
// ════════════════════════════════════════════════════════════════════════════════

/// Overlay of pending writes on top of a committed base state.
struct StagedTxn<'a> {
    base: &'a LedgerState,
    passes: HashMap<PassId, PassRecord>,
    networks: HashMap<NetworkId, GatekeeperNetwork>,
    events: Vec<PassEvent>,
}

impl<'a> StagedTxn<'a> {
    fn new(base: &'a LedgerState) -> Self {
        StagedTxn {
            base,
            passes: HashMap::new(),
            networks: HashMap::new(),
            events: Vec::new(),
        }
    }

    fn into_writes(self) -> StagedWrites {
        StagedWrites {
            passes: self.passes,
            networks: self.networks,
            events: self.events,
        }
    }
}

impl LedgerTxn for StagedTxn<'_> {
    fn read_pass(&self, id: &PassId) -> Option<PassRecord> {
        self.passes
            .get(id)
            .or_else(|| self.base.passes.get(id))
            .cloned()
    }

    fn write_pass(&mut self, record: PassRecord) {
        self.passes.insert(record.id, record);
    }

    fn read_network(&self, id: &NetworkId) -> Option<GatekeeperNetwork> {
        self.networks
            .get(id)
            .or_else(|| self.base.networks.get(id))
            .cloned()
    }

    fn write_network(&mut self, network: GatekeeperNetwork) {
        self.networks.insert(network.id, network);
    }

    fn record_event(&mut self, event: PassEvent) {
        self.events.push(event);
    }
}

struct StagedWrites {
    passes: HashMap<PassId, PassRecord>,
    networks: HashMap<NetworkId, GatekeeperNetwork>,
    events: Vec<PassEvent>,
}

impl StagedWrites {
    fn apply(self, state: &mut LedgerState) {
        state.networks.extend(self.networks);
        state.passes.extend(self.passes);
        state.events.extend(self.events);
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// MEMORY LEDGER
// ════════════════════════════════════════════════════════════════════════════════

/// In-process ledger behind a `parking_lot::RwLock`.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing state, e.g. one restored from a checkpoint.
    pub fn from_state(state: LedgerState) -> Self {
        MemoryLedger {
            state: RwLock::new(state),
        }
    }

    /// Clone of the committed state, event log included.
    pub fn snapshot(&self) -> LedgerState {
        self.state.read().clone()
    }

    /// State root of the committed state, computed under the read lock
    /// without cloning.
    pub fn state_root(&self) -> anyhow::Result<[u8; 32]> {
        self.state.read().compute_state_root()
    }
}

impl LedgerStorage for MemoryLedger {
    fn read_pass(&self, id: &PassId) -> Option<PassRecord> {
        self.state.read().passes.get(id).cloned()
    }

    fn read_network(&self, id: &NetworkId) -> Option<GatekeeperNetwork> {
        self.state.read().networks.get(id).cloned()
    }

    fn snapshot_pass(&self, id: &PassId) -> Option<(PassRecord, Option<GatekeeperNetwork>)> {
        let state = self.state.read();
        let pass = state.passes.get(id)?.clone();
        let network = state.networks.get(&pass.network).cloned();
        Some((pass, network))
    }

    fn passes_where(&self, filter: &dyn Fn(&PassRecord) -> bool) -> Vec<PassRecord> {
        let mut out: Vec<PassRecord> = self
            .state
            .read()
            .passes
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }

    fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    fn events_since(&self, from: usize) -> Vec<PassEvent> {
        self.state
            .read()
            .events
            .get(from..)
            .map(<[PassEvent]>::to_vec)
            .unwrap_or_default()
    }

    fn transact<R, F>(&self, op: F) -> Result<R, PassError>
    where
        F: FnOnce(&mut dyn LedgerTxn) -> Result<R, PassError>,
    {
        let mut guard = self.state.write();
        let (result, writes) = {
            let mut txn = StagedTxn::new(&guard);
            let result = op(&mut txn);
            (result, txn.into_writes())
        };
        match result {
            Ok(value) => {
                writes.apply(&mut guard);
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }
}
