use serde_json::{Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::take_body_string;

pub const CREATE_SUCCESS: Expectation = Expectation::success("api:BranchResponse");
pub const CREATE_FAILURE: Expectation = Expectation::failure("api:BranchErrorResponse");
pub const DELETE_SUCCESS: Expectation = Expectation::success("api:BranchResponse");
pub const DELETE_FAILURE: Expectation = Expectation::failure("api:BranchErrorResponse");
pub const DELETE_NOT_FOUND: Expectation = Expectation::not_found("api:BranchErrorResponse");

/// Without an origin the server creates an empty branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CreateBranch {
    Raw(String),
    #[default]
    Empty,
    From {
        origin: String,
    },
}

impl CreateBranch {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let origin = params.string("origin")?.filter(|origin| !origin.is_empty());
        params.assert_empty()?;

        Ok(match (body_string, origin) {
            (Some(body), _) => Self::Raw(body),
            (None, Some(origin)) => Self::From { origin },
            (None, None) => Self::Empty,
        })
    }
}

/// `{org}/{db}/local/branch/{branch}`, the descriptor form the server expects for `origin`.
#[must_use]
pub fn branch_descriptor(org_name: &str, db_name: &str, branch_name: &str) -> String {
    format!("{org_name}/{db_name}/local/branch/{branch_name}")
}

pub fn create(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(create_with(agent, endpoint, &CreateBranch::from_params(config)?))
}

#[must_use]
pub fn create_with(agent: &Agent, endpoint: &Endpoint, options: &CreateBranch) -> PendingRequest {
    let request = agent.post(endpoint);
    match options {
        CreateBranch::Raw(body) => request.raw_json(body.clone()),
        CreateBranch::Empty => request.json(json!({})),
        CreateBranch::From { origin } => request.json(json!({"origin": origin})),
    }
}

pub fn del(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Params::new(config)?.assert_empty()?;
    Ok(agent.delete(endpoint))
}

pub fn verify_create_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &CREATE_SUCCESS)
}

pub fn verify_create_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &CREATE_FAILURE)
}

pub fn verify_delete_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DELETE_SUCCESS)
}

pub fn verify_delete_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DELETE_FAILURE)
}

pub fn verify_delete_not_found(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DELETE_NOT_FOUND)
}
