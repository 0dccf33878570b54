use serde_json::{Map, Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::{require_non_empty, take_body_string};

pub const CREATE_SUCCESS: Expectation = Expectation::success("api:DbCreateResponse");
pub const CREATE_FAILURE: Expectation = Expectation::failure("api:DbCreateErrorResponse");
pub const DELETE_SUCCESS: Expectation = Expectation::success("api:DbDeleteResponse");
pub const DELETE_FAILURE: Expectation = Expectation::failure("api:DbDeleteErrorResponse");
pub const DELETE_NOT_FOUND: Expectation = Expectation::not_found("api:DbDeleteErrorResponse");

pub const DEFAULT_LABEL: &str = "Test label";
pub const DEFAULT_COMMENT: &str = "Test comment";

#[derive(Debug, Clone, PartialEq)]
pub enum CreateDb {
    Raw(String),
    Fields {
        label: String,
        comment: String,
        public: bool,
        schema: bool,
        prefixes: Option<Map<String, Value>>,
    },
}

impl CreateDb {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let label = params.string_or("label", DEFAULT_LABEL)?;
        let comment = params.string_or("comment", DEFAULT_COMMENT)?;
        let public = params.bool_or("public", false)?;
        let schema = params.bool_or("schema", true)?;
        let prefixes = params.object("prefixes")?;
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw(body),
            None => Self::Fields {
                label,
                comment,
                public,
                schema,
                prefixes,
            },
        })
    }
}

impl Default for CreateDb {
    fn default() -> Self {
        Self::Fields {
            label: DEFAULT_LABEL.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
            public: false,
            schema: true,
            prefixes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteDb {
    pub force: bool,
}

impl DeleteDb {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let force = params.bool_or("force", false)?;
        params.assert_empty()?;
        Ok(Self { force })
    }
}

pub fn create(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    create_with(agent, endpoint, &CreateDb::from_params(config)?)
}

pub fn create_with(agent: &Agent, endpoint: &Endpoint, options: &CreateDb) -> Result<PendingRequest> {
    let request = agent.post(endpoint);
    match options {
        CreateDb::Raw(body) => Ok(request.raw_json(body.clone())),
        CreateDb::Fields {
            label,
            comment,
            public,
            schema,
            prefixes,
        } => {
            require_non_empty("label", label)?;
            let mut body = json!({
                "label": label,
                "comment": comment,
                "public": public,
                "schema": schema,
            });
            if let Some(prefixes) = prefixes {
                body["prefixes"] = Value::Object(prefixes.clone());
            }
            Ok(request.json(body))
        }
    }
}

pub fn del(agent: &Agent, endpoint: &Endpoint, config: Value) -> Result<PendingRequest> {
    Ok(del_with(agent, endpoint, &DeleteDb::from_params(config)?))
}

#[must_use]
pub fn del_with(agent: &Agent, endpoint: &Endpoint, options: &DeleteDb) -> PendingRequest {
    let endpoint = if options.force {
        endpoint.clone().with_query("force", "true")
    } else {
        endpoint.clone()
    };
    agent.delete(&endpoint)
}

#[must_use]
pub fn exists(agent: &Agent, endpoint: &Endpoint) -> PendingRequest {
    agent.head(endpoint)
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

pub fn verify_exists(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &Expectation::status_only(200))
}

pub fn verify_not_exists(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &Expectation::status_only(404))
}

/// Deletes the database on drop unless disarmed, so a failed step after
/// `create` does not leave it behind.
#[derive(Debug)]
pub struct DbGuard {
    agent: Agent,
    endpoint: Endpoint,
    armed: bool,
}

impl DbGuard {
    #[must_use]
    pub fn new(agent: &Agent, endpoint: &Endpoint) -> Self {
        Self {
            agent: agent.clone(),
            endpoint: endpoint.clone(),
            armed: true,
        }
    }

    /// The scenario removed the database itself.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DbGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = del_with(&self.agent, &self.endpoint, &DeleteDb { force: true }).send();
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;
    use crate::agent::RequestBody;
    use crate::config::HarnessConfig;
    use crate::endpoint;
    use crate::error::ContractError;

    fn agent() -> Agent {
        Agent::new(&HarnessConfig::default()).expect("agent").auth()
    }

    fn wire_query(request: &PendingRequest) -> String {
        let built = request.build().expect("build");
        built.url().query().unwrap_or_default().to_string()
    }

    #[test]
    fn create_posts_default_fields_to_db_path() {
        let agent = agent();
        let endpoint = endpoint::db(&agent.defaults());
        let request = create(&agent, &endpoint, Value::Null).expect("request");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.path(),
            format!("/api/db/{}/{}", agent.org_name(), agent.db_name())
        );
        assert_eq!(
            request.body(),
            Some(&RequestBody::Json(json!({
                "label": "Test label",
                "comment": "Test comment",
                "public": false,
                "schema": true,
            })))
        );
    }

    #[test]
    fn create_with_prefixes_includes_them() {
        let agent = agent();
        let endpoint = endpoint::db(&agent.defaults());
        let request = create(
            &agent,
            &endpoint,
            json!({"prefixes": {"@base": "terminusdb:///data/", "@schema": "terminusdb:///schema#"}}),
        )
        .expect("request");
        let Some(RequestBody::Json(body)) = request.body() else {
            panic!("expected json body");
        };
        assert_eq!(body["prefixes"]["@base"], "terminusdb:///data/");
    }

    #[test]
    fn create_rejects_empty_label() {
        let agent = agent();
        let endpoint = endpoint::db(&agent.defaults());
        let err = create(&agent, &endpoint, json!({"label": ""})).expect_err("label");
        assert!(matches!(err, ContractError::Assertion(_)));
    }

    #[test]
    fn create_rejects_mistyped_flags() {
        let agent = agent();
        let endpoint = endpoint::db(&agent.defaults());
        let err = create(&agent, &endpoint, json!({"public": "yes"})).expect_err("type");
        assert!(matches!(err, ContractError::TypeMismatch { .. }));
    }

    #[test]
    fn delete_with_force_adds_query() {
        let agent = agent();
        let endpoint = endpoint::db(&agent.defaults());
        let request = del(&agent, &endpoint, json!({"force": true})).expect("request");
        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(wire_query(&request), "force=true");
        assert_eq!(request.body(), None);
    }

    #[test]
    fn exists_is_a_head_request() {
        let agent = agent();
        let request = exists(&agent, &endpoint::db(&agent.defaults()));
        assert_eq!(request.method(), &Method::HEAD);
    }
}
