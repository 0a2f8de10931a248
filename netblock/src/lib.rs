//! netblock — block or allow a single program's network access through
//! per-executable firewall rules.
//!
//! [`resolve::Resolver`] turns a user-supplied reference (name, fragment,
//! directory, or path) into executable paths; [`firewall::RuleManager`]
//! manages the inbound/outbound rule pair for each one.

pub mod config;
pub mod error;
pub mod firewall;
pub mod resolve;

pub use config::NetblockConfig;
pub use error::{Error, Result};
pub use firewall::{AccessState, DeleteOutcome, RuleManager, UnblockReport};
pub use resolve::Resolver;
