//! Config loader using TOML and serde.
//!
//! Every field is optional in the file; missing fields take the defaults
//! below, so an empty file is a valid configuration.
//!
//! ```toml
//! allow_reissue_after_revoke = false
//! check_expiry = true
//! expiry_tolerance_secs = 0
//! checkpoint_path = "./data/gatepass.ckpt"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::gateway::VerificationOptions;
use crate::Result;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GatepassConfig {
    /// Whether a revoked identifier may be issued again. Off by default:
    /// a revoked record stays a permanent negative record.
    pub allow_reissue_after_revoke: bool,

    /// Default relying-party expiry check.
    pub check_expiry: bool,

    /// Default grace window (seconds) after a pass's expiry.
    pub expiry_tolerance_secs: u64,

    /// Where ledger checkpoints are written, if anywhere.
    pub checkpoint_path: Option<String>,
}

impl Default for GatepassConfig {
    fn default() -> Self {
        GatepassConfig {
            allow_reissue_after_revoke: false,
            check_expiry: true,
            expiry_tolerance_secs: 0,
            checkpoint_path: None,
        }
    }
}

impl GatepassConfig {
    /// Relying-party defaults derived from this config (network required mask).
    pub fn verification_options(&self) -> VerificationOptions {
        VerificationOptions {
            required_mask: None,
            check_expiry: self.check_expiry,
            expiry_tolerance_secs: self.expiry_tolerance_secs,
        }
    }
}

/// Parse a config from TOML text.
pub fn from_toml_str(s: &str) -> Result<GatepassConfig> {
    let cfg: GatepassConfig = toml::from_str(s)?;
    Ok(cfg)
}

/// Load config from a TOML file path.
/// If file is missing or parse fails, an error is returned.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatepassConfig> {
    let p = path.as_ref();
    let s = fs::read_to_string(p)?;
    let cfg = from_toml_str(&s)?;
    tracing::debug!(path = %p.display(), "loaded gatepass config");
    Ok(cfg)
}
