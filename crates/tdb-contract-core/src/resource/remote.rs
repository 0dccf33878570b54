use serde_json::{Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::{require_non_empty, take_body_string};

pub const DEFAULT_REMOTE_NAME: &str = "origin";

pub const ADD_SUCCESS: Expectation = Expectation::success("api:AddRemoteResponse");
pub const GET_SUCCESS: Expectation = Expectation::success("api:GetRemoteResponse");
pub const UPDATE_SUCCESS: Expectation = Expectation::success("api:UpdateRemoteResponse");
pub const DELETE_SUCCESS: Expectation = Expectation::success("api:DeleteRemoteResponse");
pub const FAILURE: Expectation = Expectation::failure("api:RemoteErrorResponse");
pub const NOT_FOUND: Expectation = Expectation::not_found("api:RemoteErrorResponse");

/// Used by add (`POST`) and update (`PUT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetRemote {
    Raw(String),
    Fields {
        remote_name: String,
        remote_location: String,
    },
}

impl SetRemote {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let remote_name = params.string_or("remote_name", DEFAULT_REMOTE_NAME)?;
        let remote_location = params.string("remote_location")?.unwrap_or_default();
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw(body),
            None => Self::Fields {
                remote_name,
                remote_location,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteName {
    pub remote_name: String,
}

impl RemoteName {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let remote_name = params.string_or("remote_name", DEFAULT_REMOTE_NAME)?;
        params.assert_empty()?;
        Ok(Self { remote_name })
    }
}

pub fn add(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    add_with(agent, endpoint, &SetRemote::from_params(config)?)
}

pub fn add_with(agent: &Agent, endpoint: &Endpoint, options: &SetRemote) -> Result<PendingRequest> {
    attach(agent.post(endpoint), options)
}

pub fn update(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    update_with(agent, endpoint, &SetRemote::from_params(config)?)
}

pub fn update_with(agent: &Agent, endpoint: &Endpoint, options: &SetRemote) -> Result<PendingRequest> {
    attach(agent.put(endpoint), options)
}

fn attach(request: PendingRequest, options: &SetRemote) -> Result<PendingRequest> {
    match options {
        SetRemote::Raw(body) => Ok(request.raw_json(body.clone())),
        SetRemote::Fields {
            remote_name,
            remote_location,
        } => {
            require_non_empty("remote_name", remote_name)?;
            require_non_empty("remote_location", remote_location)?;
            Ok(request.json(json!({
                "remote_name": remote_name,
                "remote_location": remote_location,
            })))
        }
    }
}

pub fn get(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    get_with(agent, endpoint, &RemoteName::from_params(config)?)
}

pub fn get_with(agent: &Agent, endpoint: &Endpoint, options: &RemoteName) -> Result<PendingRequest> {
    require_non_empty("remote_name", &options.remote_name)?;
    Ok(agent.get(
        &endpoint
            .clone()
            .with_query("remote_name", options.remote_name.clone()),
    ))
}

pub fn del(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    del_with(agent, endpoint, &RemoteName::from_params(config)?)
}

pub fn del_with(agent: &Agent, endpoint: &Endpoint, options: &RemoteName) -> Result<PendingRequest> {
    require_non_empty("remote_name", &options.remote_name)?;
    Ok(agent
        .delete(endpoint)
        .json(json!({"remote_name": options.remote_name})))
}

pub fn verify_add_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &ADD_SUCCESS)
}

pub fn verify_get_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &GET_SUCCESS)
}

pub fn verify_update_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &UPDATE_SUCCESS)
}

pub fn verify_delete_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DELETE_SUCCESS)
}

pub fn verify_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &FAILURE)
}

pub fn verify_not_found(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &NOT_FOUND)
}
