use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContractError, Result};
use crate::jsonl::{append_line, corrupt_log, read_lines};
use crate::util::duration_ms;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub request_id: String,
    pub operation: String,
    pub status: String,
    pub latency_ms: u64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RequestLogEntry {
    fn new(operation: &str, status: &str, latency: Duration) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            operation: operation.to_string(),
            status: status.to_string(),
            latency_ms: duration_ms(latency),
            created_at: Utc::now().to_rfc3339(),
            http_status: None,
            target: None,
            error_code: None,
            error_message: None,
        }
    }
}

/// Append-only JSONL log of dispatched requests and client runs.
#[derive(Debug, Clone)]
pub struct RequestLog {
    path: PathBuf,
    write_gate: Arc<Mutex<()>>,
}

impl RequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_ok(&self, operation: &str, latency: Duration, http_status: Option<u16>, target: &str) {
        let mut entry = RequestLogEntry::new(operation, "ok", latency);
        entry.http_status = http_status;
        entry.target = Some(target.to_string());
        self.try_append(&entry);
    }

    pub fn log_error(&self, operation: &str, latency: Duration, target: &str, err: &ContractError) {
        let mut entry = RequestLogEntry::new(operation, "error", latency);
        entry.target = Some(target.to_string());
        entry.error_code = Some(err.code().to_string());
        entry.error_message = Some(err.to_string());
        self.try_append(&entry);
    }

    // Logging is best effort; a full disk must not fail the step being logged.
    fn try_append(&self, entry: &RequestLogEntry) {
        let _guard = self.write_gate.lock();
        let _ = append_line(&self.path, entry);
    }

    pub fn read_entries(&self) -> Result<Vec<RequestLogEntry>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let lines = read_lines::<RequestLogEntry>(&raw);
        if lines.is_corrupt() {
            return Err(corrupt_log(&self.path, &lines));
        }
        Ok(lines.entries)
    }
}
