#![forbid(unsafe_code)]
//! Shared domain types and the backend implementation contract.
//!
//! Both `hermes-child` (which drives a `BackendImplementation` from inside a
//! backend process) and `hermes-supervisor` (which drives the controller
//! side of the same connection) compile against this crate instead of each
//! other.

mod contract;
mod error;
mod types;

pub use contract::BackendImplementation;
pub use error::BackendError;
pub use hermes_wire::ClientConnection;
pub use types::{BackendRecord, CheckResult, ProxyRule, ProxyTarget};
