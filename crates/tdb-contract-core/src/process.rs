use std::path::{Path, PathBuf};
#[cfg(feature = "client-process")]
use std::process::Command;
use std::time::Duration;
#[cfg(feature = "client-process")]
use std::time::Instant;

/// One client-binary invocation. Arguments are passed as argv, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub operation: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ProcessSpec {
    #[must_use]
    pub fn new(operation: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            operation: operation.into(),
            program: program.into(),
            args,
            current_dir: None,
        }
    }

    #[must_use]
    pub fn with_current_dir(mut self, current_dir: &Path) -> Self {
        self.current_dir = Some(current_dir.to_path_buf());
        self
    }
}

#[cfg_attr(
    not(feature = "client-process"),
    allow(
        dead_code,
        reason = "outcome shape stays stable across feature profiles"
    )
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Blocked {
        reason: String,
    },
    SpawnError {
        error: String,
    },
    Completed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        elapsed: Duration,
    },
}

impl ProcessOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed { exit_code: Some(0), .. })
    }
}

#[must_use]
pub fn run_process(spec: &ProcessSpec) -> ProcessOutcome {
    #[cfg(feature = "client-process")]
    {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(current_dir) = &spec.current_dir {
            command.current_dir(current_dir);
        }

        let started = Instant::now();
        match command.output() {
            Ok(output) => ProcessOutcome::Completed {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                elapsed: started.elapsed(),
            },
            Err(err) => ProcessOutcome::SpawnError {
                error: err.to_string(),
            },
        }
    }

    #[cfg(not(feature = "client-process"))]
    {
        ProcessOutcome::Blocked {
            reason: format_feature_disabled_reason(&spec.operation),
        }
    }
}

#[cfg(not(feature = "client-process"))]
fn format_feature_disabled_reason(operation: &str) -> String {
    format!(
        "client_process_unavailable operation={operation} feature=client-process (compile tdb-contract-core with feature `client-process` to run the client binary)"
    )
}
