//! # Pass Registry
//!
//! Bundles [`PolicyStore`], [`LifecycleEngine`] and [`PassQuery`] over one
//! shared ledger and one addressing scheme, configured from a
//! [`GatepassConfig`].

use std::sync::Arc;

use anyhow::Result;

use gatepass_common::gateway::{PassAddressing, VerificationOptions};
use gatepass_common::GatepassConfig;

use super::lifecycle::LifecycleEngine;
use super::persistence::{load_checkpoint, save_checkpoint, validate_ledger_consistency};
use super::policy::PolicyStore;
use super::query::PassQuery;
use crate::state::{LedgerStorage, MemoryLedger};

pub struct PassRegistry<S, A> {
    storage: Arc<S>,
    config: GatepassConfig,
    pub policy: PolicyStore<S, A>,
    pub lifecycle: LifecycleEngine<S, A>,
    pub query: PassQuery<S, A>,
}

impl<S: LedgerStorage, A: PassAddressing + Clone> PassRegistry<S, A> {
    pub fn new(storage: Arc<S>, addressing: A, config: GatepassConfig) -> Self {
        PassRegistry {
            policy: PolicyStore::with_addressing(Arc::clone(&storage), addressing.clone()),
            lifecycle: LifecycleEngine::from_config(Arc::clone(&storage), addressing.clone(), &config),
            query: PassQuery::with_addressing(Arc::clone(&storage), addressing),
            storage,
            config,
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &GatepassConfig {
        &self.config
    }

    /// Relying-party defaults from the configuration.
    pub fn default_verification(&self) -> VerificationOptions {
        self.config.verification_options()
    }
}

impl<A: PassAddressing + Clone> PassRegistry<MemoryLedger, A> {
    /// Empty in-memory registry.
    pub fn in_memory(addressing: A, config: GatepassConfig) -> Self {
        Self::new(Arc::new(MemoryLedger::new()), addressing, config)
    }

    /// In-memory registry restored from the configured checkpoint.
    ///
    /// Starts empty when no checkpoint path is configured or the file
    /// does not exist yet. A checkpoint that fails the consistency check
    /// is rejected.
    pub fn open(addressing: A, config: GatepassConfig) -> Result<Self> {
        let state = match config.checkpoint_path.as_deref() {
            Some(path) if std::path::Path::new(path).exists() => {
                let state = load_checkpoint(path)?;
                validate_ledger_consistency(&state, &addressing)
                    .map_err(|e| anyhow::anyhow!("inconsistent checkpoint {}: {}", path, e))?;
                state
            }
            _ => Default::default(),
        };
        Ok(Self::new(Arc::new(MemoryLedger::from_state(state)), addressing, config))
    }

    /// Write the committed state to the configured checkpoint path.
    /// Returns `false` when no path is configured.
    pub fn checkpoint(&self) -> Result<bool> {
        match self.config.checkpoint_path.as_deref() {
            Some(path) => {
                save_checkpoint(&self.storage.snapshot(), path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
