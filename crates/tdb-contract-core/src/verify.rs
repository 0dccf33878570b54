//! Shape checks shared by every resource module's `verify_*` predicates.

use serde_json::Value;

use crate::error::{Result, VerificationFailure};
use crate::response::{ApiResponse, ApiStatus, STATUS_FIELD, TYPE_FIELD};
use crate::text::truncate_text;

const MAX_ACTUAL_CHARS: usize = 240;

/// Expected response shape. Fields are checked in order: HTTP status, `api:status`, `@type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    pub status: u16,
    pub api_status: Option<ApiStatus>,
    pub type_tag: Option<&'static str>,
}

impl Expectation {
    #[must_use]
    pub const fn success(type_tag: &'static str) -> Self {
        Self {
            status: 200,
            api_status: Some(ApiStatus::Success),
            type_tag: Some(type_tag),
        }
    }

    #[must_use]
    pub const fn failure(type_tag: &'static str) -> Self {
        Self {
            status: 400,
            api_status: Some(ApiStatus::Failure),
            type_tag: Some(type_tag),
        }
    }

    #[must_use]
    pub const fn not_found(type_tag: &'static str) -> Self {
        Self {
            status: 404,
            api_status: Some(ApiStatus::NotFound),
            type_tag: Some(type_tag),
        }
    }

    /// Endpoints whose success body carries no envelope.
    #[must_use]
    pub const fn status_only(status: u16) -> Self {
        Self {
            status,
            api_status: None,
            type_tag: None,
        }
    }
}

/// Returns the response unchanged when it matches, otherwise the first mismatching field.
pub fn expect(response: ApiResponse, expectation: &Expectation) -> Result<ApiResponse> {
    if response.status() != expectation.status {
        return Err(failure(
            &response,
            "status",
            expectation.status.to_string(),
            format!(
                "{} (body: {})",
                response.status(),
                truncate_text(response.text(), MAX_ACTUAL_CHARS)
            ),
        )
        .into());
    }
    if let Some(api_status) = expectation.api_status {
        expect_field(&response, STATUS_FIELD, api_status.as_str())?;
    }
    if let Some(type_tag) = expectation.type_tag {
        expect_field(&response, TYPE_FIELD, type_tag)?;
    }
    Ok(response)
}

fn expect_field(response: &ApiResponse, field: &str, expected: &str) -> Result<()> {
    match response.field(field) {
        Some(Value::String(actual)) if actual == expected => Ok(()),
        other => Err(failure(
            response,
            field,
            format!("{expected:?}"),
            render_actual(other),
        )
        .into()),
    }
}

fn render_actual(value: Option<&Value>) -> String {
    match value {
        None => "<missing>".to_string(),
        Some(value) => truncate_text(&value.to_string(), MAX_ACTUAL_CHARS),
    }
}

fn failure(
    response: &ApiResponse,
    field: &str,
    expected: String,
    actual: String,
) -> VerificationFailure {
    VerificationFailure::new(response.target(), field, expected, actual)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::error::ContractError;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse::from_parts("DELETE", "/api/db/a/b", status, body.to_string(), Duration::ZERO)
    }

    fn verification(err: ContractError) -> VerificationFailure {
        match err {
            ContractError::Verification(failure) => failure,
            other => panic!("expected verification failure, got {other:?}"),
        }
    }

    #[test]
    fn matching_response_passes_through_unchanged() {
        let r = response(
            200,
            json!({"api:status": "api:success", "@type": "api:DbDeleteResponse"}),
        );
        let out = expect(r.clone(), &Expectation::success("api:DbDeleteResponse")).expect("ok");
        assert_eq!(out, r);
    }

    #[test]
    fn status_is_checked_first() {
        let r = response(500, json!({"api:status": "api:failure"}));
        let failure = verification(
            expect(r, &Expectation::success("api:DbDeleteResponse")).expect_err("status"),
        );
        assert_eq!(failure.field, "status");
        assert_eq!(failure.expected, "200");
        assert!(failure.actual.starts_with("500 (body: "));
        assert_eq!(failure.target, "DELETE /api/db/a/b");
    }

    #[test]
    fn wrong_type_tag_reports_expected_and_actual() {
        let r = response(
            404,
            json!({"api:status": "api:not_found", "@type": "api:Other"}),
        );
        let failure = verification(
            expect(r, &Expectation::not_found("api:DbDeleteErrorResponse")).expect_err("type"),
        );
        assert_eq!(failure.field, "@type");
        assert_eq!(failure.expected, "\"api:DbDeleteErrorResponse\"");
        assert_eq!(failure.actual, "\"api:Other\"");
    }

    #[test]
    fn missing_field_is_reported_as_missing() {
        let r = response(400, json!({"@type": "api:DbCreateErrorResponse"}));
        let failure = verification(
            expect(r, &Expectation::failure("api:DbCreateErrorResponse")).expect_err("missing"),
        );
        assert_eq!(failure.field, "api:status");
        assert_eq!(failure.actual, "<missing>");
    }

    #[test]
    fn status_only_ignores_body() {
        let r = ApiResponse::from_parts("DELETE", "/api/document/a/b", 204, "", Duration::ZERO);
        expect(r, &Expectation::status_only(204)).expect("no content");
    }
}
