//! # Gatepass Common Crate
//!
//! Chain-agnostic core of the gateway pass system.
//!
//! ## Modules
//! - `gateway`: identifiers, flags, pass states, gatekeeper networks, pass
//!   records, validity evaluation and the fixed-width encoding
//! - `config`: TOML configuration
//!
//! ## Usage
//! ```rust,ignore
//! let id = derive_pass_id(&owner, &network.id, DEFAULT_CONSTRAINT);
//! let ok = is_valid(&pass, &network, now, None);
//! ```

pub mod config;
pub mod gateway;

pub use config::GatepassConfig;
pub use gateway::*;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
