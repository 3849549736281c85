//! # Validity Evaluation
//!
//! Decides whether a relying party should accept a presented pass.
//!
//! ## Evaluation Order (Fixed)
//!
//! 0. Network binding: the pass must belong to the network it is judged
//!    against.
//! 1. State: `pass.state == Active`.
//! 2. Expiry: `Never`, or `now < expiry (+ tolerance)`. Skipped when the
//!    relying party disables expiry checks.
//! 3. Issuer: the issuing gatekeeper is in the network's authorized set
//!    *now*. Removing a gatekeeper invalidates everything it issued.
//! 4. Flags: `pass.flags & required == required`, where `required` is the
//!    relying party's mask or, by default, the network's.
//!
//! [`ValidityEvaluator::evaluate`] runs every check and collects every
//! failure in that order. [`is_valid`] is the boolean shorthand.
//!
//! ## Properties
//!
//! - Pure: no mutation, no clock reads (`now` is a parameter), no I/O.
//! - A merely invalid pass is a `false` verdict, never an error.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::flags::FlagMask;
use super::ids::{Identity, NetworkId};
use super::network::GatekeeperNetwork;
use super::pass::{Expiry, PassRecord};
use super::status::PassState;

// ════════════════════════════════════════════════════════════════════════════════
// RELYING-PARTY OPTIONS
// ════════════════════════════════════════════════════════════════════════════════

/// Relying-party verification policy.
///
/// | Field | Default |
/// |-------|---------|
/// | `required_mask` | `None` (use the network's `required_mask`) |
/// | `check_expiry` | `true` |
/// | `expiry_tolerance_secs` | `0` |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOptions {
    /// Replaces the network's required mask when set.
    pub required_mask: Option<FlagMask>,
    pub check_expiry: bool,
    /// Grace window after expiry, for clock skew between parties.
    pub expiry_tolerance_secs: u64,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        VerificationOptions {
            required_mask: None,
            check_expiry: true,
            expiry_tolerance_secs: 0,
        }
    }
}

impl VerificationOptions {
    #[must_use]
    pub fn with_required_mask(mut self, mask: FlagMask) -> Self {
        self.required_mask = Some(mask);
        self
    }

    #[must_use]
    pub fn with_expiry_tolerance(mut self, secs: u64) -> Self {
        self.expiry_tolerance_secs = secs;
        self
    }

    #[must_use]
    pub fn without_expiry_check(mut self) -> Self {
        self.check_expiry = false;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// REPORT
// ════════════════════════════════════════════════════════════════════════════════

/// A single failed validity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidityFailure {
    NetworkMismatch {
        pass_network: NetworkId,
        network: NetworkId,
    },
    NotActive(PassState),
    Expired {
        expiry: u64,
        now: u64,
    },
    IssuerNotAuthorized(Identity),
    MissingFlags {
        required: FlagMask,
        missing: FlagMask,
    },
}

impl fmt::Display for ValidityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityFailure::NetworkMismatch { pass_network, network } => {
                write!(f, "pass belongs to network {}, not {}", pass_network, network)
            }
            ValidityFailure::NotActive(state) => write!(f, "pass is {}", state),
            ValidityFailure::Expired { expiry, now } => {
                write!(f, "pass expired at {} (now {})", expiry, now)
            }
            ValidityFailure::IssuerNotAuthorized(gk) => {
                write!(f, "issuer {} is not an authorized gatekeeper", gk)
            }
            ValidityFailure::MissingFlags { required, missing } => {
                write!(f, "missing flags {} of required {}", missing, required)
            }
        }
    }
}

/// Outcome of a full evaluation: every failed check, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityReport {
    pub failures: Vec<ValidityFailure>,
}

impl ValidityReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// EVALUATOR
// ════════════════════════════════════════════════════════════════════════════════

/// Stateless evaluator bound to a relying-party policy and a timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityEvaluator {
    options: VerificationOptions,
    now: u64,
}

impl ValidityEvaluator {
    #[must_use]
    pub fn new(options: VerificationOptions, now: u64) -> Self {
        Self { options, now }
    }

    #[must_use]
    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run every check against `pass` and `network` and collect failures.
    pub fn evaluate(&self, pass: &PassRecord, network: &GatekeeperNetwork) -> ValidityReport {
        let mut failures = Vec::new();

        if pass.network != network.id {
            failures.push(ValidityFailure::NetworkMismatch {
                pass_network: pass.network,
                network: network.id,
            });
        }

        // 1. state
        if !pass.state.is_active() {
            failures.push(ValidityFailure::NotActive(pass.state));
        }

        // 2. expiry
        if self.options.check_expiry {
            if let Expiry::At(expiry) = pass.expiry {
                if pass
                    .expiry
                    .is_expired_with_tolerance(self.now, self.options.expiry_tolerance_secs)
                {
                    failures.push(ValidityFailure::Expired { expiry, now: self.now });
                }
            }
        }

        // 3. issuer, re-derived from the current authorized set
        if !network.is_gatekeeper(&pass.issuing_gatekeeper) {
            failures.push(ValidityFailure::IssuerNotAuthorized(pass.issuing_gatekeeper));
        }

        // 4. flags
        let required = self.options.required_mask.unwrap_or(network.required_mask);
        if !pass.flags.contains_all(required) {
            failures.push(ValidityFailure::MissingFlags {
                required,
                missing: required.difference(pass.flags),
            });
        }

        ValidityReport { failures }
    }
}

/// Boolean verdict for `pass` under `network` at `now`.
///
/// `required_mask = None` uses the network's required mask; a relying
/// party may pass a stricter (or looser) mask of its own.
pub fn is_valid(
    pass: &PassRecord,
    network: &GatekeeperNetwork,
    now: u64,
    required_mask: Option<FlagMask>,
) -> bool {
    let options = VerificationOptions {
        required_mask,
        ..VerificationOptions::default()
    };
    ValidityEvaluator::new(options, now).evaluate(pass, network).is_valid()
}
