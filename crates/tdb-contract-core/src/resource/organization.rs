use serde_json::{Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint;
use crate::error::Result;
use crate::params::Params;
use crate::response::ApiResponse;
use crate::verify::{Expectation, expect};

use super::{require_non_empty, take_body_string};

pub const ADD_SUCCESS: Expectation = Expectation::success("api:AddOrganizationResponse");
// The server reuses the add response type for a successful delete.
pub const DEL_SUCCESS: Expectation = Expectation::success("api:AddOrganizationResponse");
pub const ADD_FAILURE: Expectation = Expectation::failure("api:AddOrganizationErrorResponse");
pub const DEL_FAILURE: Expectation = Expectation::failure("api:DeleteOrganizationErrorResponse");
pub const DEL_NOT_FOUND: Expectation =
    Expectation::not_found("api:DeleteOrganizationErrorResponse");

/// A raw body takes precedence over the structured fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOrganization {
    Raw(String),
    Fields {
        organization_name: String,
        user_name: String,
    },
}

impl AddOrganization {
    pub fn from_params(agent: &Agent, config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let organization_name = params.string_or("organization_name", agent.org_name())?;
        let user_name = params.string_or("user_name", agent.user_name())?;
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw(body),
            None => Self::Fields {
                organization_name,
                user_name,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOrganization {
    Raw(String),
    Fields { organization_name: String },
}

impl DeleteOrganization {
    pub fn from_params(config: Value) -> Result<Self> {
        let mut params = Params::new(config)?;
        let body_string = take_body_string(&mut params)?;
        let organization_name = params.string("organization_name")?;
        params.assert_empty()?;

        Ok(match body_string {
            Some(body) => Self::Raw(body),
            None => Self::Fields {
                organization_name: organization_name.unwrap_or_default(),
            },
        })
    }
}

pub fn add(agent: &Agent, config: Value) -> Result<PendingRequest> {
    add_with(agent, &AddOrganization::from_params(agent, config)?)
}

pub fn add_with(agent: &Agent, options: &AddOrganization) -> Result<PendingRequest> {
    let request = agent.post(&endpoint::organization());
    match options {
        AddOrganization::Raw(body) => Ok(request.raw_json(body.clone())),
        AddOrganization::Fields {
            organization_name,
            user_name,
        } => {
            require_non_empty("organization_name", organization_name)?;
            require_non_empty("user_name", user_name)?;
            Ok(request.json(json!({
                "organization_name": organization_name,
                "user_name": user_name,
            })))
        }
    }
}

pub fn del(agent: &Agent, config: Value) -> Result<PendingRequest> {
    del_with(agent, &DeleteOrganization::from_params(config)?)
}

pub fn del_with(agent: &Agent, options: &DeleteOrganization) -> Result<PendingRequest> {
    let request = agent.delete(&endpoint::organization());
    match options {
        DeleteOrganization::Raw(body) => Ok(request.raw_json(body.clone())),
        DeleteOrganization::Fields { organization_name } => {
            require_non_empty("organization_name", organization_name)?;
            Ok(request.json(json!({"organization_name": organization_name})))
        }
    }
}

pub fn verify_add_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &ADD_SUCCESS)
}

pub fn verify_add_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &ADD_FAILURE)
}

pub fn verify_del_success(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DEL_SUCCESS)
}

pub fn verify_del_failure(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DEL_FAILURE)
}

pub fn verify_del_not_found(response: ApiResponse) -> Result<ApiResponse> {
    expect(response, &DEL_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;

    use super::*;
    use crate::agent::RequestBody;
    use crate::config::HarnessConfig;
    use crate::error::{ContractError, ErrorKind};

    fn agent() -> Agent {
        Agent::new(&HarnessConfig::default()).expect("agent").auth()
    }

    #[test]
    fn add_defaults_to_agent_org_and_user() {
        let agent = agent();
        let request = add(&agent, Value::Null).expect("request");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/api/organization");
        assert_eq!(
            request.body(),
            Some(&RequestBody::Json(json!({
                "organization_name": agent.org_name(),
                "user_name": "admin",
            })))
        );
    }

    #[test]
    fn add_uses_explicit_fields() {
        let request = add(
            &agent(),
            json!({"organization_name": "acme", "user_name": "bob"}),
        )
        .expect("request");
        assert_eq!(
            request.body(),
            Some(&RequestBody::Json(json!({
                "organization_name": "acme",
                "user_name": "bob",
            })))
        );
    }

    #[test]
    fn body_string_bypasses_field_validation() {
        let request = add(
            &agent(),
            json!({"bodyString": "{\"organization_name\":", "organization_name": ""}),
        )
        .expect("raw request");
        assert_eq!(
            request.body(),
            Some(&RequestBody::Raw {
                content_type: "application/json".to_string(),
                text: "{\"organization_name\":".to_string(),
            })
        );
    }

    #[test]
    fn empty_organization_name_fails_before_dispatch() {
        let err = add(&agent(), json!({"organization_name": ""})).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert!(err.to_string().contains("organization_name"));
    }

    #[test]
    fn empty_user_name_fails_before_dispatch() {
        let err = add(&agent(), json!({"user_name": ""})).expect_err("missing");
        assert!(err.to_string().contains("user_name"));
    }

    #[test]
    fn del_requires_organization_name() {
        let err = del(&agent(), Value::Null).expect_err("missing");
        assert!(matches!(err, ContractError::Assertion(_)));
        assert!(err.to_string().contains("organization_name"));
    }

    #[test]
    fn del_sends_organization_name_in_body() {
        let request = del(&agent(), json!({"organization_name": "acme"})).expect("request");
        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(
            request.body(),
            Some(&RequestBody::Json(json!({"organization_name": "acme"})))
        );
    }

    #[test]
    fn unknown_keys_are_rejected_before_validation() {
        let err = add(&agent(), json!({"organisation_name": "acme"})).expect_err("typo");
        match err {
            ContractError::UnknownParameter(keys) => {
                assert_eq!(keys, vec!["organisation_name".to_string()]);
            }
            other => panic!("expected UnknownParameter, got {other:?}"),
        }
        let err = del(&agent(), json!({"user_name": "bob"})).expect_err("del has no user");
        assert!(matches!(err, ContractError::UnknownParameter(_)));
    }

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse::from_parts(
            "DELETE",
            "/api/organization",
            status,
            body.to_string(),
            Duration::ZERO,
        )
    }

    #[test]
    fn delete_success_reuses_add_response_type() {
        let r = response(
            200,
            json!({"api:status": "api:success", "@type": "api:AddOrganizationResponse"}),
        );
        verify_del_success(r).expect("delete success");

        let r = response(
            200,
            json!({"api:status": "api:success", "@type": "api:DeleteOrganizationResponse"}),
        );
        assert!(verify_del_success(r).is_err());
    }

    #[test]
    fn not_found_and_failure_envelopes_are_distinct() {
        let not_found = response(
            404,
            json!({"api:status": "api:not_found", "@type": "api:DeleteOrganizationErrorResponse"}),
        );
        verify_del_not_found(not_found.clone()).expect("not found");
        assert!(verify_del_failure(not_found).is_err());

        let failure = response(
            400,
            json!({"api:status": "api:failure", "@type": "api:AddOrganizationErrorResponse"}),
        );
        verify_add_failure(failure.clone()).expect("failure");
        assert!(verify_add_success(failure).is_err());
    }
}
