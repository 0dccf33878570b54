//! Driver for the companion command-line client.
//!
//! The client signals failure with a nonzero exit code, an empty stdout and a
//! stderr that starts with `Error: ` followed by a category-specific message.
//! Failures are often the expected outcome, so results are matched by category
//! or pattern rather than treated as errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex_lite::Regex;

use crate::config::HarnessConfig;
use crate::error::{ContractError, Result, VerificationFailure};
use crate::process::{ProcessOutcome, ProcessSpec, run_process};
use crate::request_log::RequestLog;
use crate::text::{shell_quote, truncate_text};

const ERROR_PREFIX: &str = "Error: ";
const UNKNOWN_DATABASE_PREFIX: &str = "Unknown database: ";
const SOCKET_ERROR_PREFIX: &str = "HTTP request failed with socket error: ";
const MAX_OUTPUT_CHARS: usize = 240;

#[derive(Debug, Clone)]
pub struct CliDriver {
    program: PathBuf,
    storage_dir: PathBuf,
    working_dir: Option<PathBuf>,
    user_name: String,
    password: String,
    request_log: Option<RequestLog>,
}

impl CliDriver {
    #[must_use]
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            program: config.client_bin.clone(),
            storage_dir: config.storage_dir.clone(),
            working_dir: None,
            user_name: config.user_name.clone(),
            password: config.password.clone(),
            request_log: config.request_log.clone().map(RequestLog::new),
        }
    }

    /// Directory the client runs in; relative program and storage paths resolve against it.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_request_log(mut self, log: RequestLog) -> Self {
        self.request_log = Some(log);
        self
    }

    #[must_use]
    pub fn program(&self) -> PathBuf {
        self.resolve(&self.program)
    }

    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.resolve(&self.storage_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// A command carrying the driver's `--user`/`--password` flags.
    #[must_use]
    pub fn authenticated(&self, words: &[&str]) -> ClientCommand {
        ClientCommand::new(words).credentials(&self.user_name, &self.password)
    }

    pub fn run(&self, command: &ClientCommand) -> Result<ClientOutput> {
        let program = self.program();
        let command_line = command.command_line(&program);
        let mut spec = ProcessSpec::new(command.label(), &program, command.argv());
        if let Some(dir) = &self.working_dir {
            spec = spec.with_current_dir(dir);
        }

        match run_process(&spec) {
            ProcessOutcome::Completed {
                exit_code,
                stdout,
                stderr,
                elapsed,
            } => {
                if let Some(log) = &self.request_log {
                    log.log_ok(&command.label(), elapsed, None, &command_line);
                }
                Ok(ClientOutput {
                    label: command.label(),
                    command_line,
                    exit_code,
                    stdout,
                    stderr,
                    elapsed,
                })
            }
            ProcessOutcome::SpawnError { error: message }
            | ProcessOutcome::Blocked { reason: message } => {
                let err = ContractError::Spawn {
                    program: program.display().to_string(),
                    message,
                };
                if let Some(log) = &self.request_log {
                    log.log_error(&command.label(), Duration::ZERO, &command_line, &err);
                }
                Err(err)
            }
        }
    }

    /// `store init [--force]`; the client must succeed.
    pub fn store_init(&self, force: bool) -> Result<ClientOutput> {
        let mut command = ClientCommand::new(&["store", "init"]);
        if force {
            command = command.flag("--force");
        }
        self.run(&command)?.verify(expect_success)
    }

    /// Removes the storage directory when dropped.
    #[must_use]
    pub fn storage_guard(&self) -> StorageGuard {
        StorageGuard::new(self.storage_dir())
    }
}

/// Argument vector for one client invocation: subcommand words, credentials,
/// extra flags and an optional positional target, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCommand {
    words: Vec<String>,
    credentials: Option<(String, String)>,
    flags: Vec<String>,
    target: Option<String>,
}

impl ClientCommand {
    #[must_use]
    pub fn new(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(ToString::to_string).collect(),
            credentials: None,
            flags: Vec::new(),
            target: None,
        }
    }

    #[must_use]
    pub fn credentials(mut self, user_name: &str, password: &str) -> Self {
        self.credentials = Some((user_name.to_string(), password.to_string()));
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.words.clone();
        if let Some((user_name, password)) = &self.credentials {
            argv.push(format!("--user={user_name}"));
            argv.push(format!("--password={password}"));
        }
        argv.extend(self.flags.iter().cloned());
        argv.extend(self.target.iter().cloned());
        argv
    }

    /// `cli <words>`, used as the verification target and log operation.
    #[must_use]
    pub fn label(&self) -> String {
        format!("cli {}", self.words.join(" "))
    }

    /// Shell-quoted rendering for diagnostics. Execution never goes through a shell.
    #[must_use]
    pub fn command_line(&self, program: &Path) -> String {
        std::iter::once(program.display().to_string())
            .chain(self.argv())
            .map(|word| shell_quote(&word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOutput {
    label: String,
    command_line: String,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    elapsed: Duration,
}

impl ClientOutput {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// `None` when the process was killed by a signal.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    #[must_use]
    pub fn category(&self) -> ClientErrorCategory {
        classify_stderr(&self.stderr)
    }

    pub fn verify(self, predicate: impl FnOnce(Self) -> Result<Self>) -> Result<Self> {
        predicate(self)
    }

    fn mismatch(&self, field: &str, expected: impl Into<String>, actual: &str) -> ContractError {
        VerificationFailure::new(
            self.label.clone(),
            field,
            expected,
            truncate_text(actual, MAX_OUTPUT_CHARS),
        )
        .into()
    }
}

#[derive(Debug, Clone)]
pub enum OutputPattern {
    /// Anchored literal prefix.
    Prefix(String),
    Regex(Regex),
    Contains(String),
}

impl OutputPattern {
    #[must_use]
    pub fn prefix(text: impl Into<String>) -> Self {
        Self::Prefix(text.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|err| ContractError::InvalidPattern(format!("{pattern}: {err}")))
    }

    #[must_use]
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    /// `^Error: Unknown database: <spec>`, the spec matched literally.
    pub fn unknown_database(db_spec: &str) -> Result<Self> {
        Self::regex(&format!(
            "^{ERROR_PREFIX}{UNKNOWN_DATABASE_PREFIX}{}",
            regex_lite::escape(db_spec)
        ))
    }

    pub fn connection_refused() -> Result<Self> {
        Self::regex(&format!(
            "^{ERROR_PREFIX}{SOCKET_ERROR_PREFIX}Connection refused"
        ))
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Prefix(prefix) => text.starts_with(prefix.as_str()),
            Self::Regex(regex) => regex.is_match(text),
            Self::Contains(needle) => text.contains(needle.as_str()),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Prefix(prefix) => format!("starts with {prefix:?}"),
            Self::Regex(regex) => format!("matches /{}/", regex.as_str()),
            Self::Contains(needle) => format!("contains {needle:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorCategory {
    UnknownDatabase,
    SocketError,
    Other,
}

impl ClientErrorCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownDatabase => "unknown_database",
            Self::SocketError => "socket_error",
            Self::Other => "other",
        }
    }
}

#[must_use]
pub fn classify_stderr(stderr: &str) -> ClientErrorCategory {
    let Some(message) = stderr.strip_prefix(ERROR_PREFIX) else {
        return ClientErrorCategory::Other;
    };
    if message.starts_with(UNKNOWN_DATABASE_PREFIX) {
        ClientErrorCategory::UnknownDatabase
    } else if message.starts_with(SOCKET_ERROR_PREFIX) {
        ClientErrorCategory::SocketError
    } else {
        ClientErrorCategory::Other
    }
}

fn expect_failed_quietly(output: &ClientOutput) -> Result<()> {
    if output.succeeded() {
        return Err(output.mismatch("exit_code", "nonzero", "0"));
    }
    if !output.stdout.is_empty() {
        return Err(output.mismatch("stdout", "\"\"", &output.stdout));
    }
    Ok(())
}

/// Nonzero exit, empty stdout and a stderr matching `pattern`.
pub fn expect_failure(output: ClientOutput, pattern: &OutputPattern) -> Result<ClientOutput> {
    expect_failed_quietly(&output)?;
    if !pattern.is_match(&output.stderr) {
        return Err(output.mismatch("stderr", pattern.describe(), &output.stderr));
    }
    Ok(output)
}

pub fn expect_failure_category(
    output: ClientOutput,
    category: ClientErrorCategory,
) -> Result<ClientOutput> {
    expect_failed_quietly(&output)?;
    let actual = output.category();
    if actual != category {
        return Err(output.mismatch(
            "stderr",
            format!("category {}", category.as_str()),
            &format!("category {} ({})", actual.as_str(), output.stderr.trim_end()),
        ));
    }
    Ok(output)
}

pub fn expect_success(output: ClientOutput) -> Result<ClientOutput> {
    if output.succeeded() {
        return Ok(output);
    }
    let actual = match output.exit_code {
        Some(code) => format!("{code} (stderr: {})", output.stderr.trim_end()),
        None => format!("terminated by signal (stderr: {})", output.stderr.trim_end()),
    };
    Err(output.mismatch("exit_code", "0", &actual))
}

/// Removes the client's storage directory on drop, whether or not the test body failed.
#[derive(Debug)]
pub struct StorageGuard {
    path: PathBuf,
}

impl StorageGuard {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StorageGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
