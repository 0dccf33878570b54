use serde_json::{Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::{CommitInfo, require_present, take_body_string};

pub const QUERY_SUCCESS: Expectation = Expectation::success("api:WoqlResponse");
pub const QUERY_FAILURE: Expectation = Expectation::failure("api:WoqlErrorResponse");

#[derive(Debug, Clone, PartialEq)]
pub enum WoqlQuery {
    Raw(String),
    Fields {
        query: Value,
        commit: CommitInfo,
        all_witnesses: bool,
    },
}

impl WoqlQuery {
    pub fn from_params(agent: &Agent, config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let query = params.document("query")?;
        let commit = CommitInfo::from_params(&mut params, agent)?;
        let all_witnesses = params.bool_or("all_witnesses", false)?;
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw(body),
            None => Self::Fields {
                query: require_present("query", query)?,
                commit,
                all_witnesses,
            },
        })
    }
}

pub fn query(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(query_with(agent, endpoint, &WoqlQuery::from_params(agent, config)?))
}

#[must_use]
pub fn query_with(agent: &Agent, endpoint: &Endpoint, options: &WoqlQuery) -> PendingRequest {
    let request = agent.post(endpoint);
    match options {
        WoqlQuery::Raw(body) => request.raw_json(body.clone()),
        WoqlQuery::Fields {
            query,
            commit,
            all_witnesses,
        } => {
            let mut body = json!({
                "query": query,
                "commit_info": commit.to_value(),
            });
            if *all_witnesses {
                body["all_witnesses"] = Value::Bool(true);
            }
            request.json(body)
        }
    }
}

/// Rows of a successful query response.
#[must_use]
pub fn bindings(response: &ApiResponse) -> Vec<Value> {
    response
        .field("bindings")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub fn verify_query_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &QUERY_SUCCESS)
}

pub fn verify_query_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &QUERY_FAILURE)
}
