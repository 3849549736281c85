//! # Ledger Checkpoints
//!
//! Snapshot and restore of the full [`LedgerState`] via `bincode`, plus
//! a consistency check to run after every restore.
//!
//! ## Invariants Checked
//!
//! 1. Every network is keyed by its own identifier.
//! 2. Every pass is keyed by its own identifier.
//! 3. Every pass identifier equals the derivation of its
//!    `(owner, network, constraint)` under the ledger's addressing scheme.
//! 4. Every pass references an existing network.
//! 5. Every pass's flags are defined in its network.
//! 6. Every network's required mask is defined in its catalogue.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use gatepass_common::gateway::PassAddressing;

use crate::state::LedgerState;

// ════════════════════════════════════════════════════════════════════════════════
// CHECKPOINTS
// ════════════════════════════════════════════════════════════════════════════════

/// Serialize the full ledger state.
pub fn create_checkpoint(state: &LedgerState) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(state)
        .map_err(|e| anyhow::anyhow!("checkpoint serialization failed: {}", e))?;
    Ok(bytes)
}

/// Restore a ledger state from [`create_checkpoint`] bytes.
///
/// The restored state has the same state root as the one checkpointed.
pub fn restore_from_checkpoint(data: &[u8]) -> Result<LedgerState> {
    let state: LedgerState = bincode::deserialize(data)
        .map_err(|e| anyhow::anyhow!("checkpoint deserialization failed: {}", e))?;
    Ok(state)
}

/// Write a checkpoint to `path`, creating parent directories as needed.
pub fn save_checkpoint(state: &LedgerState, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating checkpoint dir {}", parent.display()))?;
        }
    }
    let bytes = create_checkpoint(state)?;
    fs::write(path, &bytes).with_context(|| format!("writing checkpoint {}", path.display()))?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        passes = state.pass_count(),
        networks = state.network_count(),
        "checkpoint saved"
    );
    Ok(())
}

/// Read a checkpoint from `path`.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<LedgerState> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading checkpoint {}", path.display()))?;
    let state = restore_from_checkpoint(&bytes)?;
    info!(
        path = %path.display(),
        passes = state.pass_count(),
        networks = state.network_count(),
        "checkpoint loaded"
    );
    Ok(state)
}

// ════════════════════════════════════════════════════════════════════════════════
// CONSISTENCY VALIDATION
// ════════════════════════════════════════════════════════════════════════════════

/// Check the structural invariants of a (restored) ledger.
///
/// Returns the first violation found, as a human-readable message.
pub fn validate_ledger_consistency<A: PassAddressing>(
    state: &LedgerState,
    addressing: &A,
) -> Result<(), String> {
    for (key, network) in &state.networks {
        if *key != network.id {
            return Err(format!("network keyed at {} has id {}", key, network.id));
        }
        let undefined = network.required_mask.difference(network.defined_mask());
        if !undefined.is_empty() {
            return Err(format!(
                "network {} requires undefined flags {}",
                network.id, undefined
            ));
        }
    }

    for (key, pass) in &state.passes {
        if *key != pass.id {
            return Err(format!("pass keyed at {} has id {}", key, pass.id));
        }

        let derived = addressing.pass_id(&pass.owner, &pass.network, pass.constraint);
        if derived != pass.id {
            return Err(format!(
                "pass {} does not match derived identifier {}",
                pass.id, derived
            ));
        }

        let network = state
            .networks
            .get(&pass.network)
            .ok_or_else(|| format!("pass {} references missing network {}", pass.id, pass.network))?;

        if !pass.flags.is_subset_of(network.defined_mask()) {
            return Err(format!(
                "pass {} carries flags {} undefined in network {}",
                pass.id, pass.flags, network.id
            ));
        }
    }

    Ok(())
}
