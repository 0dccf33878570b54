use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::util::duration_ms;

pub const STATUS_FIELD: &str = "api:status";
pub const TYPE_FIELD: &str = "@type";

/// Body-level outcome tag carried in `api:status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiStatus {
    #[serde(rename = "api:success")]
    Success,
    #[serde(rename = "api:failure")]
    Failure,
    #[serde(rename = "api:not_found")]
    NotFound,
}

impl ApiStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "api:success",
            Self::Failure => "api:failure",
            Self::NotFound => "api:not_found",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "api:success" => Some(Self::Success),
            "api:failure" => Some(Self::Failure),
            "api:not_found" => Some(Self::NotFound),
            _ => None,
        }
    }
}

impl Display for ApiStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{api:status, @type}` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub status: ApiStatus,
    pub type_tag: String,
}

impl Envelope {
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        let status = body.get(STATUS_FIELD)?.as_str().and_then(ApiStatus::parse)?;
        let type_tag = body.get(TYPE_FIELD)?.as_str()?.to_string();
        Some(Self { status, type_tag })
    }
}

/// Mutually exclusive outcome classes keyed on HTTP status and body status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Success,
    Failure,
    NotFound,
    Unclassified,
}

impl ResponseKind {
    #[must_use]
    pub fn classify(response: &ApiResponse) -> Self {
        let api_status = response.api_status().and_then(ApiStatus::parse);
        match (response.status(), api_status) {
            (200..=299, Some(ApiStatus::Success)) => Self::Success,
            (400, Some(ApiStatus::Failure)) => Self::Failure,
            (404, Some(ApiStatus::NotFound)) => Self::NotFound,
            _ => Self::Unclassified,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    method: String,
    path: String,
    status: u16,
    text: String,
    json: Option<Value>,
    latency: Duration,
}

impl ApiResponse {
    /// Bodies that are not JSON are kept as text with no parsed value.
    #[must_use]
    pub fn from_parts(
        method: &str,
        path: &str,
        status: u16,
        text: impl Into<String>,
        latency: Duration,
    ) -> Self {
        let text = text.into();
        let json = serde_json::from_str(&text).ok();
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            text,
            json,
            latency,
        }
    }

    pub(crate) fn read(
        method: &str,
        path: &str,
        response: reqwest::blocking::Response,
        started: Instant,
    ) -> Result<Self> {
        let status = response.status().as_u16();
        let text = response.text()?;
        Ok(Self::from_parts(method, path, status, text, started.elapsed()))
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }

    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        duration_ms(self.latency)
    }

    #[must_use]
    pub fn target(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.json.as_ref().and_then(|body| body.get(name))
    }

    #[must_use]
    pub fn api_status(&self) -> Option<&str> {
        self.field(STATUS_FIELD).and_then(Value::as_str)
    }

    #[must_use]
    pub fn type_tag(&self) -> Option<&str> {
        self.field(TYPE_FIELD).and_then(Value::as_str)
    }

    #[must_use]
    pub fn envelope(&self) -> Option<Envelope> {
        self.json.as_ref().and_then(Envelope::from_body)
    }

    #[must_use]
    pub fn kind(&self) -> ResponseKind {
        ResponseKind::classify(self)
    }

    /// Applies a verification predicate, passing the response through on success.
    pub fn verify(self, predicate: impl FnOnce(Self) -> Result<Self>) -> Result<Self> {
        predicate(self)
    }
}
