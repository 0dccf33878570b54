use serde_json::{Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::{CommitInfo, require_non_empty, require_present, take_body_string};

pub const GET_SUCCESS: Expectation = Expectation::status_only(200);
pub const INSERT_SUCCESS: Expectation = Expectation::success("api:TriplesInsertResponse");
pub const FAILURE: Expectation = Expectation::failure("api:TriplesErrorResponse");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertTriples {
    Raw(String),
    Turtle { turtle: String, commit: CommitInfo },
}

impl InsertTriples {
    pub fn from_params(agent: &Agent, config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let turtle = params.string("turtle")?;
        let commit = CommitInfo::from_params(&mut params, agent)?;
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw(body),
            None => Self::Turtle {
                turtle: require_present("turtle", turtle)?,
                commit,
            },
        })
    }
}

pub fn get(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Params::new(config)?.assert_empty()?;
    Ok(agent.get(endpoint))
}

pub fn insert(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    insert_with(agent, endpoint, &InsertTriples::from_params(agent, config)?)
}

pub fn insert_with(
    agent: &Agent,
    endpoint: &Endpoint,
    options: &InsertTriples,
) -> Result<PendingRequest> {
    let request = agent.put(endpoint);
    match options {
        InsertTriples::Raw(body) => Ok(request.raw_json(body.clone())),
        InsertTriples::Turtle { turtle, commit } => {
            require_non_empty("turtle", turtle)?;
            Ok(request.json(json!({
                "turtle": turtle,
                "commit_info": commit.to_value(),
            })))
        }
    }
}

pub fn verify_get_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &GET_SUCCESS)
}

pub fn verify_insert_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &INSERT_SUCCESS)
}

pub fn verify_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &FAILURE)
}
