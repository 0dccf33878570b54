//! Request builders and verification predicates, one module per API resource family.
//!
//! Every builder has two entry points: `op(agent, ..., config)` takes a loose JSON
//! configuration and folds it into a closed option record through [`Params`], and
//! `op_with(agent, ..., &Options)` takes the record directly. Verification
//! predicates return the response unchanged so they chain with
//! [`ApiResponse::verify`](crate::response::ApiResponse::verify).

use serde::Serialize;
use serde_json::{Value, json};

use crate::agent::Agent;
use crate::error::{ContractError, Result};
use crate::params::Params;

pub mod branch;
pub mod db;
pub mod document;
pub mod organization;
pub mod remote;
pub mod system;
pub mod triples;
pub mod woql;

pub(crate) const BODY_STRING: &str = "bodyString";
pub(crate) const DEFAULT_COMMIT_MESSAGE: &str = "tdb-contract";

/// Literal request body override. An empty string counts as absent.
pub(crate) fn take_body_string(params: &mut Params) -> Result<Option<String>> {
    Ok(params
        .string(BODY_STRING)?
        .filter(|body| !body.is_empty()))
}

pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ContractError::missing_parameter(name));
    }
    Ok(())
}

pub(crate) fn require_present<T>(name: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| ContractError::missing_parameter(name))
}

/// Author and message attached to every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub author: String,
    pub message: String,
}

impl CommitInfo {
    pub(crate) fn from_params(params: &mut Params, agent: &Agent) -> Result<Self> {
        Ok(Self {
            author: params.string_or("author", agent.user_name())?,
            message: params.string_or("message", DEFAULT_COMMIT_MESSAGE)?,
        })
    }

    pub(crate) fn to_value(&self) -> Value {
        json!({"author": self.author, "message": self.message})
    }
}
