//! Server liveness (`/api/ok`) and version information (`/api/info`).

use crate::agent::{Agent, PendingRequest};
use crate::endpoint;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

pub const OK_SUCCESS: Expectation = Expectation::status_only(200);
pub const INFO_SUCCESS: Expectation = Expectation::success("api:InfoResponse");

#[must_use]
pub fn ok(agent: &Agent) -> PendingRequest {
    agent.get(&endpoint::ok())
}

#[must_use]
pub fn info(agent: &Agent) -> PendingRequest {
    agent.get(&endpoint::info())
}

pub fn verify_ok(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &OK_SUCCESS)
}

pub fn verify_info_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &INFO_SUCCESS)
}

/// `api:info` → `terminusdb` → `version`, when present.
#[must_use]
pub fn server_version(response: &ApiResponse) -> Option<String> {
    response
        .field("api:info")
        .and_then(|info| info.pointer("/terminusdb/version"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
