//! # Policy Store
//!
//! Creates gatekeeper networks and applies authority-gated policy changes
//! to them: gatekeeper membership, flag catalogue, required mask and
//! default pass lifetime.
//!
//! ## Validation Order
//!
//! 1. Network exists (`NotFound`).
//! 2. Caller is the network authority (`Unauthorized`).
//! 3. Operation-specific checks (`AlreadyExists`, `InvalidFlag`,
//!    `CapacityExceeded`).
//!
//! All checks run inside the same ledger transaction as the write. A
//! rejected call leaves the network and the audit log unchanged.

use std::sync::Arc;

use tracing::{info, warn};

use gatepass_common::gateway::{
    AccountAddressing, FlagMask, GatekeeperNetwork, Identity, NetworkId, PassAddressing, PassError,
};

use super::events::PassEvent;
use crate::state::{LedgerStorage, LedgerTxn};

pub struct PolicyStore<S, A = AccountAddressing> {
    storage: Arc<S>,
    addressing: A,
}

impl<S: LedgerStorage> PolicyStore<S, AccountAddressing> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_addressing(storage, AccountAddressing)
    }
}

impl<S: LedgerStorage, A: PassAddressing> PolicyStore<S, A> {
    pub fn with_addressing(storage: Arc<S>, addressing: A) -> Self {
        PolicyStore { storage, addressing }
    }

    pub fn addressing(&self) -> &A {
        &self.addressing
    }

    /// Committed network, if any.
    pub fn network(&self, id: &NetworkId) -> Option<GatekeeperNetwork> {
        self.storage.read_network(id)
    }

    /// Create the network owned by `authority`.
    ///
    /// The identifier is derived from the authority, so each authority
    /// owns at most one network.
    ///
    /// ## Errors
    ///
    /// - `AlreadyExists` if the derived identifier is taken.
    /// - `NameTooLong`, `AlreadyExists` (duplicate flag names) or
    ///   `CapacityExceeded` from the initial definition.
    pub fn create_network<F: AsRef<str>>(
        &self,
        authority: &Identity,
        name: &str,
        initial_flags: &[F],
        pass_expiry_secs: u64,
        now: u64,
    ) -> Result<GatekeeperNetwork, PassError> {
        let id = self.addressing.network_id(authority);
        let network = self.storage.transact(|txn| {
            if txn.read_network(&id).is_some() {
                return Err(PassError::AlreadyExists(format!("network {}", id)));
            }
            let network = GatekeeperNetwork::new(
                id,
                *authority,
                name,
                initial_flags,
                pass_expiry_secs,
                now,
            )?;
            txn.record_event(PassEvent::NetworkCreated {
                network: id,
                authority: *authority,
                name: network.name.clone(),
                timestamp: now,
            });
            for (index, flag) in network.flags.names().iter().enumerate() {
                txn.record_event(PassEvent::FlagDefined {
                    network: id,
                    index: index as u8,
                    name: flag.clone(),
                    timestamp: now,
                });
            }
            txn.write_network(network.clone());
            Ok(network)
        })?;
        info!(network = %id, authority = %authority, name = %network.name, "network created");
        Ok(network)
    }

    /// Authorize `gatekeeper`. Adding a present gatekeeper is a no-op and
    /// records no event. Returns whether the set changed.
    pub fn add_gatekeeper(
        &self,
        caller: &Identity,
        network: &NetworkId,
        gatekeeper: Identity,
        now: u64,
    ) -> Result<bool, PassError> {
        let added = self.update_network(caller, network, |txn, n| {
            let added = n.add_gatekeeper(caller, gatekeeper)?;
            if added {
                txn.record_event(PassEvent::GatekeeperAdded {
                    network: n.id,
                    gatekeeper,
                    timestamp: now,
                });
            }
            Ok(added)
        })?;
        if added {
            info!(network = %network, gatekeeper = %gatekeeper, "gatekeeper added");
        }
        Ok(added)
    }

    /// Unauthorize `gatekeeper`. Removing an absent gatekeeper is a no-op.
    ///
    /// Passes it issued stay stored unchanged but stop evaluating valid.
    pub fn remove_gatekeeper(
        &self,
        caller: &Identity,
        network: &NetworkId,
        gatekeeper: &Identity,
        now: u64,
    ) -> Result<bool, PassError> {
        let removed = self.update_network(caller, network, |txn, n| {
            let removed = n.remove_gatekeeper(caller, gatekeeper)?;
            if removed {
                txn.record_event(PassEvent::GatekeeperRemoved {
                    network: n.id,
                    gatekeeper: *gatekeeper,
                    timestamp: now,
                });
            }
            Ok(removed)
        })?;
        if removed {
            info!(network = %network, gatekeeper = %gatekeeper, "gatekeeper removed");
        }
        Ok(removed)
    }

    /// Append a flag at the next free bit and return its index.
    pub fn define_flag(
        &self,
        caller: &Identity,
        network: &NetworkId,
        name: &str,
        now: u64,
    ) -> Result<u8, PassError> {
        let index = self.update_network(caller, network, |txn, n| {
            let index = n.define_flag(caller, name)?;
            txn.record_event(PassEvent::FlagDefined {
                network: n.id,
                index,
                name: name.to_string(),
                timestamp: now,
            });
            Ok(index)
        })?;
        info!(network = %network, flag = name, index, "flag defined");
        Ok(index)
    }

    pub fn set_required_mask(
        &self,
        caller: &Identity,
        network: &NetworkId,
        mask: FlagMask,
        now: u64,
    ) -> Result<(), PassError> {
        self.update_network(caller, network, |txn, n| {
            n.set_required_mask(caller, mask)?;
            txn.record_event(PassEvent::RequiredMaskSet {
                network: n.id,
                mask,
                timestamp: now,
            });
            Ok(())
        })?;
        info!(network = %network, mask = %mask, "required mask set");
        Ok(())
    }

    /// Change the default lifetime of passes issued from now on. `0`
    /// means new passes never expire. Existing passes keep their expiry.
    pub fn set_pass_expiry(
        &self,
        caller: &Identity,
        network: &NetworkId,
        secs: u64,
        now: u64,
    ) -> Result<(), PassError> {
        self.update_network(caller, network, |txn, n| {
            n.set_pass_expiry(caller, secs)?;
            txn.record_event(PassEvent::PassExpirySet {
                network: n.id,
                secs,
                timestamp: now,
            });
            Ok(())
        })?;
        info!(network = %network, secs, "pass expiry set");
        Ok(())
    }

    /// Load, mutate and write back one network inside a transaction.
    ///
    /// The authority check runs before `mutate` so an unauthorized caller
    /// is reported as `Unauthorized` regardless of the mutation.
    fn update_network<R, F>(
        &self,
        caller: &Identity,
        id: &NetworkId,
        mutate: F,
    ) -> Result<R, PassError>
    where
        F: FnOnce(&mut dyn LedgerTxn, &mut GatekeeperNetwork) -> Result<R, PassError>,
    {
        let result = self.storage.transact(|txn| {
            let mut network = txn
                .read_network(id)
                .ok_or_else(|| PassError::NotFound(format!("network {}", id)))?;
            network.ensure_authority(caller, "change network policy")?;
            let out = mutate(&mut *txn, &mut network)?;
            txn.write_network(network);
            Ok(out)
        });
        if let Err(PassError::Unauthorized { .. }) = &result {
            warn!(network = %id, caller = %caller, "rejected policy change from non-authority");
        }
        result
    }
}
