//! # gatepass-chain
//!
//! Ledger for gateway passes: transactional storage, policy and lifecycle
//! engines, relying-party queries and checkpoints.
//!
//! ```text
//! PassRegistry
//!   ├── PolicyStore      networks, gatekeepers, flags
//!   ├── LifecycleEngine  pass state transitions
//!   └── PassQuery        lookup and verification
//!           │
//!     LedgerStorage::transact   (MemoryLedger)
//! ```

pub mod gateway;
pub mod state;

pub use gateway::{
    IssueRequest, LifecycleEngine, PassEvent, PassQuery, PassRegistry, PolicyStore,
};
pub use state::{LedgerState, LedgerStorage, LedgerTxn, MemoryLedger};
