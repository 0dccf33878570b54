// Public fallible APIs in this crate share one concrete error contract (`ContractError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod agent;
pub mod bench;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub(crate) mod jsonl;
pub mod params;
pub mod process;
pub mod request_log;
pub mod resource;
pub mod response;
pub(crate) mod text;
pub mod util;
pub mod verify;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use agent::{Agent, AuthMode, Context, ContextOverrides, PendingRequest, RequestBody};
pub use client::{
    CliDriver, ClientCommand, ClientErrorCategory, ClientOutput, OutputPattern, StorageGuard,
};
pub use config::HarnessConfig;
pub use endpoint::{Endpoint, GraphType, ResourceKind};
pub use error::{ContractError, ErrorKind, Result, VerificationFailure};
pub use params::Params;
pub use request_log::{RequestLog, RequestLogEntry};
pub use resource::{branch, db, document, organization, remote, system, triples, woql};
pub use response::{ApiResponse, ApiStatus, Envelope, ResponseKind};
pub use verify::{Expectation, expect};
