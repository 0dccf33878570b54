//! Line-oriented storage behind the request log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ContractError, Result};

/// First line that failed to parse, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadLine {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LogLines<T> {
    pub entries: Vec<T>,
    pub skipped: usize,
    pub first_bad: Option<BadLine>,
}

impl<T> LogLines<T> {
    /// Something was written but none of it is readable.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        self.entries.is_empty() && self.skipped > 0
    }
}

/// Serializes `entry` as one line and appends it, creating parent directories.
pub fn append_line<T: Serialize>(path: &Path, entry: &T) -> Result<()> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Parses every non-blank line, skipping the ones that do not deserialize.
#[must_use]
pub fn read_lines<T: DeserializeOwned>(raw: &str) -> LogLines<T> {
    let mut lines = LogLines {
        entries: Vec::new(),
        skipped: 0,
        first_bad: None,
    };
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(entry) => lines.entries.push(entry),
            Err(err) => {
                lines.skipped += 1;
                if lines.first_bad.is_none() {
                    lines.first_bad = Some(BadLine {
                        line: index + 1,
                        message: err.to_string(),
                    });
                }
            }
        }
    }
    lines
}

#[must_use]
pub fn corrupt_log<T>(path: &Path, lines: &LogLines<T>) -> ContractError {
    let detail = match &lines.first_bad {
        Some(bad) => format!(
            "skipped {} invalid lines (first at line {}: {})",
            lines.skipped, bad.line, bad.message
        ),
        None => format!("skipped {} invalid lines", lines.skipped),
    };
    ContractError::CorruptLog {
        path: path.display().to_string(),
        detail,
    }
}
