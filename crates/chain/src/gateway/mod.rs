//! # Gateway Pass Ledger
//!
//! Storage-backed realization of the gateway pass model from
//! `gatepass_common::gateway`.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `policy` | Network creation and authority-gated policy changes |
//! | `lifecycle` | Issue, freeze, unfreeze, revoke, refresh expiry, set flags |
//! | `query` | Lookup, listing and relying-party verification |
//! | `events` | Audit log entries and their binary encoding |
//! | `persistence` | Checkpoints and consistency validation |
//! | `registry` | All of the above over one ledger |
//!
//! ## Atomicity
//!
//! Every mutating operation runs inside one `LedgerStorage::transact`
//! call: its reads, checks, record write and audit event commit together
//! or not at all.

pub mod events;
pub mod lifecycle;
pub mod persistence;
pub mod policy;
pub mod query;
pub mod registry;

pub use events::{encode_pass_event, PassEvent, EVENT_ENCODING_VERSION};
pub use lifecycle::{IssueRequest, LifecycleEngine};
pub use persistence::{
    create_checkpoint, load_checkpoint, restore_from_checkpoint, save_checkpoint,
    validate_ledger_consistency,
};
pub use policy::PolicyStore;
pub use query::PassQuery;
pub use registry::PassRegistry;

#[cfg(test)]
mod tests;
