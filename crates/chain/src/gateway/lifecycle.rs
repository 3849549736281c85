//! # Pass Lifecycle Engine
//!
//! State transitions of gateway passes, each validated against the
//! pass's network and committed in one ledger transaction together with
//! its audit event.
//!
//! ## Operations
//!
//! | Operation | Allowed caller | From state | To state |
//! |-----------|----------------|------------|----------|
//! | `issue` | authorized gatekeeper | (none) / Revoked* | Active |
//! | `freeze` | issuer or authority | Active | Frozen |
//! | `unfreeze` | issuer or authority | Frozen | Active |
//! | `revoke` | issuer or authority | Active, Frozen | Revoked |
//! | `refresh_expiry` | issuer or authority | Active, Frozen | unchanged |
//! | `set_flags` | issuer | Active, Frozen | unchanged |
//!
//! *only when re-issuance after revocation is enabled.
//!
//! "Issuer" means the pass's issuing gatekeeper while it is still in the
//! network's authorized set. The network authority may always manage
//! passes in its network.
//!
//! ## Check Order
//!
//! 1. Existence: network and pass (`NotFound`)
//! 2. Revoked pass (`InvalidState`, whoever the caller is)
//! 3. Authority (`Unauthorized`)
//! 4. Transition state (`InvalidState`, `AlreadyExists` on issue)
//! 5. Flags (`InvalidFlag`)
//!
//! The first failing check determines the error. Nothing is written on
//! failure. A revoked pass is a permanent record, so every mutation of
//! it reports `InvalidState` before the caller is even considered.

use std::sync::Arc;

use tracing::{info, warn};

use gatepass_common::gateway::{
    AccountAddressing, Constraint, Expiry, FlagMask, GatekeeperNetwork, Identity, NetworkId,
    PassAddressing, PassError, PassId, PassRecord, PassState, DEFAULT_CONSTRAINT,
};
use gatepass_common::GatepassConfig;

use super::events::PassEvent;
use crate::state::LedgerStorage;

// ════════════════════════════════════════════════════════════════════════════════
// ISSUE REQUEST
// ════════════════════════════════════════════════════════════════════════════════

/// Parameters of [`LifecycleEngine::issue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRequest {
    pub owner: Identity,
    pub network: NetworkId,
    pub constraint: Constraint,
    /// Authenticated caller; must be an authorized gatekeeper.
    pub gatekeeper: Identity,
    pub flags: FlagMask,
    /// `None` takes the network's default lifetime.
    pub expiry: Option<Expiry>,
}

impl IssueRequest {
    pub fn new(owner: Identity, network: NetworkId, gatekeeper: Identity) -> Self {
        IssueRequest {
            owner,
            network,
            constraint: DEFAULT_CONSTRAINT,
            gatekeeper,
            flags: FlagMask::EMPTY,
            expiry: None,
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FlagMask) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Who may perform a management operation on an existing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Actor {
    IssuerOrAuthority,
    IssuerOnly,
}

// ════════════════════════════════════════════════════════════════════════════════
// ENGINE
// ════════════════════════════════════════════════════════════════════════════════

pub struct LifecycleEngine<S, A = AccountAddressing> {
    storage: Arc<S>,
    addressing: A,
    allow_reissue_after_revoke: bool,
}

impl<S: LedgerStorage> LifecycleEngine<S, AccountAddressing> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_addressing(storage, AccountAddressing)
    }
}

impl<S: LedgerStorage, A: PassAddressing> LifecycleEngine<S, A> {
    pub fn with_addressing(storage: Arc<S>, addressing: A) -> Self {
        LifecycleEngine {
            storage,
            addressing,
            allow_reissue_after_revoke: false,
        }
    }

    pub fn from_config(storage: Arc<S>, addressing: A, config: &GatepassConfig) -> Self {
        Self::with_addressing(storage, addressing)
            .with_reissue_after_revoke(config.allow_reissue_after_revoke)
    }

    #[must_use]
    pub fn with_reissue_after_revoke(mut self, allow: bool) -> Self {
        self.allow_reissue_after_revoke = allow;
        self
    }

    pub fn allows_reissue_after_revoke(&self) -> bool {
        self.allow_reissue_after_revoke
    }

    /// Identifier a pass for `(owner, network, constraint)` lives at.
    pub fn pass_id(&self, owner: &Identity, network: &NetworkId, constraint: Constraint) -> PassId {
        self.addressing.pass_id(owner, network, constraint)
    }

    /// Issue a pass in `Active` state.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: network does not exist
    /// - `Unauthorized`: `request.gatekeeper` is not authorized in the network
    /// - `AlreadyExists`: a record exists at the derived identifier (a
    ///   revoked one is replaced only when re-issuance is enabled)
    /// - `InvalidFlag`: `request.flags` references undefined bits
    pub fn issue(&self, request: IssueRequest, now: u64) -> Result<PassRecord, PassError> {
        let id = self
            .addressing
            .pass_id(&request.owner, &request.network, request.constraint);
        let allow_reissue = self.allow_reissue_after_revoke;

        let result = self.storage.transact(|txn| {
            let network = txn
                .read_network(&request.network)
                .ok_or_else(|| PassError::NotFound(format!("network {}", request.network)))?;

            if !network.is_gatekeeper(&request.gatekeeper) {
                return Err(PassError::unauthorized(&request.gatekeeper, "issue pass"));
            }

            if let Some(existing) = txn.read_pass(&id) {
                let replaceable = allow_reissue && existing.state == PassState::Revoked;
                if !replaceable {
                    return Err(PassError::AlreadyExists(format!(
                        "pass {} ({})",
                        id, existing.state
                    )));
                }
            }

            network.flags.check_defined(request.flags)?;

            let expiry = request.expiry.unwrap_or_else(|| network.default_expiry(now));
            let record = PassRecord::new(
                id,
                request.owner,
                request.network,
                request.constraint,
                request.gatekeeper,
                request.flags,
                expiry,
                now,
            );
            txn.record_event(PassEvent::PassIssued {
                pass: id,
                owner: request.owner,
                network: request.network,
                gatekeeper: request.gatekeeper,
                flags: request.flags,
                expiry,
                timestamp: now,
            });
            txn.write_pass(record.clone());
            Ok(record)
        });

        match &result {
            Ok(record) => info!(
                pass = %record.id,
                owner = %record.owner,
                gatekeeper = %record.issuing_gatekeeper,
                expiry = %record.expiry,
                "pass issued"
            ),
            Err(PassError::Unauthorized { .. }) => warn!(
                network = %request.network,
                gatekeeper = %request.gatekeeper,
                "rejected issue from unauthorized gatekeeper"
            ),
            Err(_) => {}
        }
        result
    }

    /// `Active → Frozen`.
    pub fn freeze(&self, caller: &Identity, id: &PassId, now: u64) -> Result<PassRecord, PassError> {
        let record = self.mutate_pass(caller, id, "freeze pass", Actor::IssuerOrAuthority, |pass, _| {
            pass.transition_to(PassState::Frozen, now, "freeze pass")?;
            Ok(PassEvent::PassFrozen { pass: pass.id, by: *caller, timestamp: now })
        })?;
        info!(pass = %id, by = %caller, "pass frozen");
        Ok(record)
    }

    /// `Frozen → Active`.
    pub fn unfreeze(&self, caller: &Identity, id: &PassId, now: u64) -> Result<PassRecord, PassError> {
        let record = self.mutate_pass(caller, id, "unfreeze pass", Actor::IssuerOrAuthority, |pass, _| {
            pass.transition_to(PassState::Active, now, "unfreeze pass")?;
            Ok(PassEvent::PassUnfrozen { pass: pass.id, by: *caller, timestamp: now })
        })?;
        info!(pass = %id, by = %caller, "pass unfrozen");
        Ok(record)
    }

    /// Any non-terminal state `→ Revoked`. The record stays stored.
    pub fn revoke(&self, caller: &Identity, id: &PassId, now: u64) -> Result<PassRecord, PassError> {
        let record = self.mutate_pass(caller, id, "revoke pass", Actor::IssuerOrAuthority, |pass, _| {
            pass.transition_to(PassState::Revoked, now, "revoke pass")?;
            Ok(PassEvent::PassRevoked { pass: pass.id, by: *caller, timestamp: now })
        })?;
        info!(pass = %id, by = %caller, "pass revoked");
        Ok(record)
    }

    /// Replace the pass's expiry. Permitted while the pass is not revoked.
    pub fn refresh_expiry(
        &self,
        caller: &Identity,
        id: &PassId,
        expiry: Expiry,
        now: u64,
    ) -> Result<PassRecord, PassError> {
        let record = self.mutate_pass(caller, id, "refresh expiry", Actor::IssuerOrAuthority, |pass, _| {
            pass.expiry = expiry;
            pass.last_updated = now;
            Ok(PassEvent::ExpiryRefreshed { pass: pass.id, by: *caller, expiry, timestamp: now })
        })?;
        info!(pass = %id, by = %caller, expiry = %expiry, "pass expiry refreshed");
        Ok(record)
    }

    /// Replace the pass's flags. Only the issuing gatekeeper may attest.
    pub fn set_flags(
        &self,
        caller: &Identity,
        id: &PassId,
        flags: FlagMask,
        now: u64,
    ) -> Result<PassRecord, PassError> {
        let record = self.mutate_pass(caller, id, "set flags", Actor::IssuerOnly, |pass, network| {
            network.flags.check_defined(flags)?;
            pass.flags = flags;
            pass.last_updated = now;
            Ok(PassEvent::FlagsSet { pass: pass.id, by: *caller, flags, timestamp: now })
        })?;
        info!(pass = %id, by = %caller, flags = %flags, "pass flags set");
        Ok(record)
    }

    /// Load pass and network, check the caller, apply `mutate`, then write
    /// the record and its event. All inside one transaction.
    fn mutate_pass<F>(
        &self,
        caller: &Identity,
        id: &PassId,
        action: &str,
        actor: Actor,
        mutate: F,
    ) -> Result<PassRecord, PassError>
    where
        F: FnOnce(&mut PassRecord, &GatekeeperNetwork) -> Result<PassEvent, PassError>,
    {
        let result = self.storage.transact(|txn| {
            let mut pass = txn
                .read_pass(id)
                .ok_or_else(|| PassError::NotFound(format!("pass {}", id)))?;
            let network = txn
                .read_network(&pass.network)
                .ok_or_else(|| PassError::NotFound(format!("network {}", pass.network)))?;

            pass.ensure_mutable(action)?;
            if !may_manage(caller, &pass, &network, actor) {
                return Err(PassError::unauthorized(caller, action));
            }

            let event = mutate(&mut pass, &network)?;
            txn.record_event(event);
            txn.write_pass(pass.clone());
            Ok(pass)
        });
        if let Err(PassError::Unauthorized { .. }) = &result {
            warn!(pass = %id, caller = %caller, action, "rejected pass change");
        }
        result
    }
}

fn may_manage(caller: &Identity, pass: &PassRecord, network: &GatekeeperNetwork, actor: Actor) -> bool {
    let is_issuer = *caller == pass.issuing_gatekeeper && network.is_gatekeeper(caller);
    match actor {
        Actor::IssuerOnly => is_issuer,
        Actor::IssuerOrAuthority => is_issuer || *caller == network.authority,
    }
}
