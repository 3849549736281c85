//! # Pass Queries
//!
//! Read-only API for relying parties and operators. Every method reads
//! committed state only and never mutates the ledger.
//!
//! ## Absent vs Invalid
//!
//! `verify` distinguishes a pass that does not exist (`NotFound`) from
//! one that exists but fails evaluation (`Ok(false)`). Callers that only
//! want a boolean treat both as "reject".

use std::sync::Arc;

use tracing::debug;

use gatepass_common::gateway::{
    AccountAddressing, Constraint, Identity, NetworkId, PassAddressing, PassError, PassId,
    PassRecord, ValidityEvaluator, ValidityReport, VerificationOptions,
};

use crate::state::LedgerStorage;

pub struct PassQuery<S, A = AccountAddressing> {
    storage: Arc<S>,
    addressing: A,
}

impl<S: LedgerStorage> PassQuery<S, AccountAddressing> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_addressing(storage, AccountAddressing)
    }
}

impl<S: LedgerStorage, A: PassAddressing> PassQuery<S, A> {
    pub fn with_addressing(storage: Arc<S>, addressing: A) -> Self {
        PassQuery { storage, addressing }
    }

    /// Locate a pass from its owner, network and constraint alone.
    pub fn find_pass(
        &self,
        owner: &Identity,
        network: &NetworkId,
        constraint: Constraint,
    ) -> Option<PassRecord> {
        let id = self.addressing.pass_id(owner, network, constraint);
        self.storage.read_pass(&id)
    }

    pub fn get_pass(&self, id: &PassId) -> Option<PassRecord> {
        self.storage.read_pass(id)
    }

    /// Boolean verdict for the pass at `(owner, network, constraint)`.
    ///
    /// ## Errors
    ///
    /// `NotFound` if the pass or its network does not exist.
    pub fn verify(
        &self,
        owner: &Identity,
        network: &NetworkId,
        constraint: Constraint,
        now: u64,
        options: &VerificationOptions,
    ) -> Result<bool, PassError> {
        Ok(self
            .verify_detailed(owner, network, constraint, now, options)?
            .is_valid())
    }

    /// Every failed check for the pass at `(owner, network, constraint)`.
    pub fn verify_detailed(
        &self,
        owner: &Identity,
        network: &NetworkId,
        constraint: Constraint,
        now: u64,
        options: &VerificationOptions,
    ) -> Result<ValidityReport, PassError> {
        let id = self.addressing.pass_id(owner, network, constraint);
        self.verify_pass_id(&id, now, options)
    }

    /// Evaluate a pass by identifier against its own network.
    pub fn verify_pass_id(
        &self,
        id: &PassId,
        now: u64,
        options: &VerificationOptions,
    ) -> Result<ValidityReport, PassError> {
        let (pass, network) = self
            .storage
            .snapshot_pass(id)
            .ok_or_else(|| PassError::NotFound(format!("pass {}", id)))?;
        let network =
            network.ok_or_else(|| PassError::NotFound(format!("network {}", pass.network)))?;

        let report = ValidityEvaluator::new(*options, now).evaluate(&pass, &network);
        debug!(
            pass = %id,
            now,
            valid = report.is_valid(),
            failures = report.failures.len(),
            "pass verified"
        );
        Ok(report)
    }

    /// Every pass held by `owner`, across networks, sorted by identifier.
    pub fn passes_for_owner(&self, owner: &Identity) -> Vec<PassRecord> {
        let owner = *owner;
        self.storage.passes_where(&move |p: &PassRecord| p.owner == owner)
    }

    /// Every pass issued under `network`, revoked ones included.
    pub fn passes_for_network(&self, network: &NetworkId) -> Vec<PassRecord> {
        let network = *network;
        self.storage.passes_where(&move |p: &PassRecord| p.network == network)
    }

    /// Passes of `network` currently in `Active` state. Expiry and issuer
    /// status are not considered; use `verify` for a verdict.
    pub fn count_active(&self, network: &NetworkId) -> usize {
        let network = *network;
        self.storage
            .passes_where(&move |p: &PassRecord| p.network == network && p.state.is_active())
            .len()
    }
}
