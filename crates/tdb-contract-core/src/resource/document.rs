//! `/api/document/{org}/{db}`: document insert, replace, get and delete.
//!
//! Successful document writes answer with a bare JSON list of ids rather than an
//! `api:status` envelope, so the success predicates check the HTTP status only.

use serde_json::Value;

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::{Endpoint, GraphType};
use crate::error::{ContractError, Result};
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::{CommitInfo, require_present, take_body_string};

pub const INSERT_SUCCESS: Expectation = Expectation::status_only(200);
pub const INSERT_FAILURE: Expectation = Expectation::failure("api:InsertDocumentErrorResponse");
pub const REPLACE_SUCCESS: Expectation = Expectation::status_only(200);
pub const REPLACE_FAILURE: Expectation = Expectation::failure("api:ReplaceDocumentErrorResponse");
pub const GET_SUCCESS: Expectation = Expectation::status_only(200);
pub const GET_FAILURE: Expectation = Expectation::failure("api:GetDocumentErrorResponse");
pub const GET_NOT_FOUND: Expectation = Expectation::not_found("api:GetDocumentErrorResponse");
pub const DELETE_SUCCESS: Expectation = Expectation::status_only(204);
pub const DELETE_FAILURE: Expectation = Expectation::failure("api:DeleteDocumentErrorResponse");

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    Raw(String),
    Json(Value),
}

/// Options shared by insert (`POST`) and replace (`PUT`).
#[derive(Debug, Clone, PartialEq)]
pub struct WriteDocuments {
    pub graph_type: GraphType,
    pub commit: CommitInfo,
    pub body: DocumentBody,
    pub full_replace: bool,
    pub raw_json: bool,
    /// Replace only: create documents that do not exist yet.
    pub create: bool,
}

impl WriteDocuments {
    pub fn insert_from_params(agent: &Agent, config: Value) -> Result<Self> {
        Self::from_params(agent, config, false)
    }

    pub fn replace_from_params(agent: &Agent, config: Value) -> Result<Self> {
        Self::from_params(agent, config, true)
    }

    fn from_params(agent: &Agent, config: Value, replace: bool) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let schema = params.document("schema")?;
        let instance = params.document("instance")?;
        let graph_type = params
            .string("graph_type")?
            .map(|raw| raw.parse::<GraphType>())
            .transpose()?;
        let commit = CommitInfo::from_params(&mut params, agent)?;
        let full_replace = params.bool_or("full_replace", false)?;
        let raw_json = params.bool_or("raw_json", false)?;
        let create = if replace {
            params.bool_or("create", false)?
        } else {
            false
        };
        params.assert_empty()?;

        let (body, graph_type) = select_body(body_string, schema, instance, graph_type)?;
        Ok(Self {
            graph_type,
            commit,
            body,
            full_replace,
            raw_json,
            create,
        })
    }

    fn endpoint(&self, endpoint: &Endpoint) -> Endpoint {
        let mut endpoint = endpoint
            .clone()
            .with_query("graph_type", self.graph_type.as_str())
            .with_query("author", self.commit.author.clone())
            .with_query("message", self.commit.message.clone());
        if self.full_replace {
            endpoint = endpoint.with_query("full_replace", "true");
        }
        if self.raw_json {
            endpoint = endpoint.with_query("raw_json", "true");
        }
        if self.create {
            endpoint = endpoint.with_query("create", "true");
        }
        endpoint
    }
}

fn select_body(
    body_string: Option<String>,
    schema: Option<Value>,
    instance: Option<Value>,
    graph_type: Option<GraphType>,
) -> Result<(DocumentBody, GraphType)> {
    if let Some(body) = body_string {
        return Ok((DocumentBody::Raw(body), graph_type.unwrap_or(GraphType::Instance)));
    }
    let (body, implied) = match (schema, instance) {
        (Some(_), Some(_)) => {
            return Err(ContractError::Assertion(
                "Pass either 'schema' or 'instance', not both.".to_string(),
            ));
        }
        (Some(schema), None) => (schema, GraphType::Schema),
        (None, Some(instance)) => (instance, GraphType::Instance),
        (None, None) => {
            return Err(ContractError::Assertion(
                "Missing 'schema' or 'instance' parameter.".to_string(),
            ));
        }
    };
    if let Some(explicit) = graph_type
        && explicit != implied
    {
        return Err(ContractError::Assertion(format!(
            "'graph_type' is '{explicit}' but the body was passed as '{implied}'."
        )));
    }
    Ok((DocumentBody::Json(body), implied))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDocuments {
    pub graph_type: GraphType,
    pub id: Option<String>,
    pub as_list: bool,
}

impl GetDocuments {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let graph_type = params
            .string_or("graph_type", GraphType::Instance.as_str())?
            .parse::<GraphType>()?;
        let id = params.string("id")?;
        let as_list = params.bool_or("as_list", false)?;
        params.assert_empty()?;
        Ok(Self {
            graph_type,
            id,
            as_list,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteDocuments {
    Raw {
        graph_type: GraphType,
        commit: CommitInfo,
        body: String,
    },
    ById {
        graph_type: GraphType,
        commit: CommitInfo,
        id: String,
    },
}

impl DeleteDocuments {
    pub fn from_params(agent: &Agent, config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let id = params.string("id")?;
        let graph_type = params
            .string_or("graph_type", GraphType::Instance.as_str())?
            .parse::<GraphType>()?;
        let commit = CommitInfo::from_params(&mut params, agent)?;
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw {
                graph_type,
                commit,
                body,
            },
            None => Self::ById {
                graph_type,
                commit,
                id: require_present("id", id.filter(|id| !id.is_empty()))?,
            },
        })
    }
}

pub fn insert(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(insert_with(
        agent,
        endpoint,
        &WriteDocuments::insert_from_params(agent, config)?,
    ))
}

#[must_use]
pub fn insert_with(agent: &Agent, endpoint: &Endpoint, options: &WriteDocuments) -> PendingRequest {
    attach_body(agent.post(&options.endpoint(endpoint)), &options.body)
}

pub fn replace(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(replace_with(
        agent,
        endpoint,
        &WriteDocuments::replace_from_params(agent, config)?,
    ))
}

#[must_use]
pub fn replace_with(agent: &Agent, endpoint: &Endpoint, options: &WriteDocuments) -> PendingRequest {
    attach_body(agent.put(&options.endpoint(endpoint)), &options.body)
}

pub fn get(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(get_with(agent, endpoint, &GetDocuments::from_params(config)?))
}

#[must_use]
pub fn get_with(agent: &Agent, endpoint: &Endpoint, options: &GetDocuments) -> PendingRequest {
    let mut endpoint = endpoint
        .clone()
        .with_query("graph_type", options.graph_type.as_str());
    if let Some(id) = &options.id {
        endpoint = endpoint.with_query("id", id.clone());
    }
    if options.as_list {
        endpoint = endpoint.with_query("as_list", "true");
    }
    agent.get(&endpoint)
}

pub fn del(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(del_with(
        agent,
        endpoint,
        &DeleteDocuments::from_params(agent, config)?,
    ))
}

#[must_use]
pub fn del_with(agent: &Agent, endpoint: &Endpoint, options: &DeleteDocuments) -> PendingRequest {
    let with_commit = |graph_type: &GraphType, commit: &CommitInfo| {
        endpoint
            .clone()
            .with_query("graph_type", graph_type.as_str())
            .with_query("author", commit.author.clone())
            .with_query("message", commit.message.clone())
    };
    match options {
        DeleteDocuments::Raw {
            graph_type,
            commit,
            body,
        } => agent
            .delete(&with_commit(graph_type, commit))
            .raw_json(body.clone()),
        DeleteDocuments::ById {
            graph_type,
            commit,
            id,
        } => agent.delete(&with_commit(graph_type, commit).with_query("id", id.clone())),
    }
}

fn attach_body(request: PendingRequest, body: &DocumentBody) -> PendingRequest {
    match body {
        DocumentBody::Raw(text) => request.raw_json(text.clone()),
        DocumentBody::Json(value) => request.json(value.clone()),
    }
}

/// Ids from a successful insert or replace body.
#[must_use]
pub fn written_ids(response: &ApiResponse) -> Vec<String> {
    response
        .json()
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn verify_insert_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &INSERT_SUCCESS)
}

pub fn verify_insert_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &INSERT_FAILURE)
}

pub fn verify_replace_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &REPLACE_SUCCESS)
}

pub fn verify_replace_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &REPLACE_FAILURE)
}

pub fn verify_get_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &GET_SUCCESS)
}

pub fn verify_get_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &GET_FAILURE)
}

pub fn verify_get_not_found(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &GET_NOT_FOUND)
}

pub fn verify_delete_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DELETE_SUCCESS)
}

pub fn verify_delete_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DELETE_FAILURE)
}
