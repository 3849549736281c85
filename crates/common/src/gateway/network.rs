//! # Gatekeeper Network
//!
//! `GatekeeperNetwork` is the policy domain a pass is issued under. All
//! authority state lives in explicit fields on the entity, so several
//! networks can coexist and be exercised independently.
//!
//! ## Authority Model
//!
//! Every mutator takes the authenticated caller and checks it against
//! `authority` before touching any field. A failed check leaves the
//! network unchanged.
//!
//! ## Lifecycle
//!
//! Networks are permanent once created. Deactivation means removing every
//! gatekeeper, which also invalidates every outstanding pass because trust
//! in the issuer is re-derived at verification time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::error::PassError;
use super::flags::{FlagCatalogue, FlagMask};
use super::ids::{Identity, NetworkId};
use super::pass::Expiry;

/// Maximum length of a network display name, in bytes.
pub const MAX_NETWORK_NAME_LEN: usize = 32;

// ════════════════════════════════════════════════════════════════════════════════
// GATEKEEPER NETWORK
// ════════════════════════════════════════════════════════════════════════════════

/// Policy domain grouping gatekeepers, flags and expiry rules.
///
/// ## Invariants
///
/// - `name.len() <= MAX_NETWORK_NAME_LEN`
/// - each gatekeeper appears at most once (`BTreeSet`)
/// - `required_mask` only references bits defined in `flags`
/// - flag bit positions are append-only
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatekeeperNetwork {
    pub id: NetworkId,
    /// Identity allowed to change this network's policy.
    pub authority: Identity,
    pub name: String,
    /// Default pass lifetime in seconds. `0` means passes never expire.
    pub pass_expiry_secs: u64,
    pub gatekeepers: BTreeSet<Identity>,
    pub flags: FlagCatalogue,
    /// Bits every pass must carry to be valid network-wide.
    pub required_mask: FlagMask,
    pub created_at: u64,
}

impl GatekeeperNetwork {
    /// Build a network with no gatekeepers and an empty required mask.
    ///
    /// ## Errors
    ///
    /// - `NameTooLong` if `name` exceeds [`MAX_NETWORK_NAME_LEN`] bytes.
    /// - `AlreadyExists` / `CapacityExceeded` from the initial flag list.
    pub fn new<S: AsRef<str>>(
        id: NetworkId,
        authority: Identity,
        name: &str,
        initial_flags: &[S],
        pass_expiry_secs: u64,
        created_at: u64,
    ) -> Result<Self, PassError> {
        if name.len() > MAX_NETWORK_NAME_LEN {
            return Err(PassError::NameTooLong {
                len: name.len(),
                max: MAX_NETWORK_NAME_LEN,
            });
        }
        let flags = FlagCatalogue::from_names(initial_flags)?;
        Ok(GatekeeperNetwork {
            id,
            authority,
            name: name.to_string(),
            pass_expiry_secs,
            gatekeepers: BTreeSet::new(),
            flags,
            required_mask: FlagMask::EMPTY,
            created_at,
        })
    }

    /// `Unauthorized` unless `caller` is this network's authority.
    pub fn ensure_authority(&self, caller: &Identity, action: &str) -> Result<(), PassError> {
        if *caller != self.authority {
            return Err(PassError::unauthorized(caller, action));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_gatekeeper(&self, identity: &Identity) -> bool {
        self.gatekeepers.contains(identity)
    }

    #[must_use]
    pub fn defined_mask(&self) -> FlagMask {
        self.flags.defined_mask()
    }

    /// Expiry a pass issued at `issued_at` receives when none is requested.
    #[must_use]
    pub fn default_expiry(&self, issued_at: u64) -> Expiry {
        if self.pass_expiry_secs == 0 {
            Expiry::Never
        } else {
            Expiry::At(issued_at.saturating_add(self.pass_expiry_secs))
        }
    }

    /// Authorize `gatekeeper`. Returns `false` when it was already present.
    pub fn add_gatekeeper(
        &mut self,
        caller: &Identity,
        gatekeeper: Identity,
    ) -> Result<bool, PassError> {
        self.ensure_authority(caller, "add gatekeeper")?;
        Ok(self.gatekeepers.insert(gatekeeper))
    }

    /// Unauthorize `gatekeeper`. Returns `false` when it was not present.
    ///
    /// Removing an absent gatekeeper is a no-op rather than `NotFound`.
    pub fn remove_gatekeeper(
        &mut self,
        caller: &Identity,
        gatekeeper: &Identity,
    ) -> Result<bool, PassError> {
        self.ensure_authority(caller, "remove gatekeeper")?;
        Ok(self.gatekeepers.remove(gatekeeper))
    }

    /// Append a flag and return its bit index.
    pub fn define_flag(&mut self, caller: &Identity, name: &str) -> Result<u8, PassError> {
        self.ensure_authority(caller, "define flag")?;
        self.flags.define(name)
    }

    pub fn set_required_mask(&mut self, caller: &Identity, mask: FlagMask) -> Result<(), PassError> {
        self.ensure_authority(caller, "set required flags")?;
        self.flags.check_defined(mask)?;
        self.required_mask = mask;
        Ok(())
    }

    /// Change the default lifetime of passes issued from now on.
    pub fn set_pass_expiry(&mut self, caller: &Identity, secs: u64) -> Result<(), PassError> {
        self.ensure_authority(caller, "set pass expiry")?;
        self.pass_expiry_secs = secs;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
