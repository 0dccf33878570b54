use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContractError>;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("unknown parameter(s): {}", .0.join(", "))]
    UnknownParameter(Vec<String>),

    #[error("parameter '{name}' expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: String,
    },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error(transparent)]
    Verification(#[from] VerificationFailure),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("failed to spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("invalid output pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("request log {path} is unreadable: {detail}")]
    CorruptLog { path: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Taxonomy bucket an error belongs to. All kinds are fatal to the current test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parameter,
    Assertion,
    Verification,
    Transport,
    Internal,
}

impl ContractError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownParameter(_) => "UNKNOWN_PARAMETER",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::InvalidParams(_) => "INVALID_PARAMS",
            Self::Assertion(_) => "ASSERTION_FAILED",
            Self::Verification(_) => "VERIFICATION_FAILED",
            Self::Http(_) => "HTTP_ERROR",
            Self::Spawn { .. } => "SPAWN_ERROR",
            Self::InvalidPattern(_) => "INVALID_PATTERN",
            Self::Config(_) => "CONFIG_ERROR",
            Self::CorruptLog { .. } => "CORRUPT_LOG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownParameter(_) | Self::TypeMismatch { .. } | Self::InvalidParams(_) => {
                ErrorKind::Parameter
            }
            Self::Assertion(_) => ErrorKind::Assertion,
            Self::Verification(_) => ErrorKind::Verification,
            Self::Http(_) | Self::Spawn { .. } => ErrorKind::Transport,
            Self::InvalidPattern(_)
            | Self::Config(_)
            | Self::CorruptLog { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn missing_parameter(name: &str) -> Self {
        Self::Assertion(format!("Missing '{name}' parameter."))
    }
}

/// A response or process result that broke its expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("verification failed for {target}: {field} expected {expected}, got {actual}")]
pub struct VerificationFailure {
    pub target: String,
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl VerificationFailure {
    pub fn new(
        target: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
