use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ContractError, Result};

mod env;

pub const BASE_URL_ENV: &str = "TDB_CONTRACT_BASE_URL";
pub const USER_ENV: &str = "TDB_CONTRACT_USER";
pub const PASS_ENV: &str = "TDB_CONTRACT_PASS";
pub const ORG_ENV: &str = "TDB_CONTRACT_ORG";
pub const DB_ENV: &str = "TDB_CONTRACT_DB";
pub const CLIENT_BIN_ENV: &str = "TDB_CONTRACT_CLIENT_BIN";
pub const STORAGE_ENV: &str = "TDB_CONTRACT_STORAGE";
pub const TIMEOUT_MS_ENV: &str = "TDB_CONTRACT_TIMEOUT_MS";
pub const REQUEST_LOG_ENV: &str = "TDB_CONTRACT_REQUEST_LOG";
pub const LIVE_ENV: &str = "TDB_CONTRACT_LIVE";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6363";
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "root";
pub const DEFAULT_CLIENT_BIN: &str = "./tdb.sh";
pub const DEFAULT_STORAGE_DIR: &str = "storage";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Process-wide harness configuration. Loaded once and passed explicitly to every
/// `Agent` and `CliDriver`; nothing else reads the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub base_url: String,
    pub user_name: String,
    pub password: String,
    pub org_name: Option<String>,
    pub db_name: Option<String>,
    pub client_bin: PathBuf,
    pub storage_dir: PathBuf,
    pub timeout_ms: u64,
    pub request_log: Option<PathBuf>,
    /// Run the live contract suites against a real server and client binary.
    pub live: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_name: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            org_name: None,
            db_name: None,
            client_bin: PathBuf::from(DEFAULT_CLIENT_BIN),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_log: None,
            live: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    user_name: Option<String>,
    password: Option<String>,
    org_name: Option<String>,
    db_name: Option<String>,
    client_bin: Option<PathBuf>,
    storage_dir: Option<PathBuf>,
    timeout_ms: Option<u64>,
    request_log: Option<PathBuf>,
    live: Option<bool>,
}

impl HarnessConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// TOML file layered over the defaults, then the environment over both.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        Ok(Self::read_toml_file(path)?.with_env_overrides())
    }

    /// TOML file layered over the defaults only.
    pub fn read_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|e| ContractError::Config(format!("config parse failed: {e}")))?;
        let mut config = Self::default();
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(user_name) = file.user_name {
            config.user_name = user_name;
        }
        if let Some(password) = file.password {
            config.password = password;
        }
        config.org_name = file.org_name.or(config.org_name);
        config.db_name = file.db_name.or(config.db_name);
        if let Some(client_bin) = file.client_bin {
            config.client_bin = client_bin;
        }
        if let Some(storage_dir) = file.storage_dir {
            config.storage_dir = storage_dir;
        }
        if let Some(timeout_ms) = file.timeout_ms {
            if timeout_ms == 0 {
                return Err(ContractError::Config(
                    "timeout_ms must be at least 1".to_string(),
                ));
            }
            config.timeout_ms = timeout_ms;
        }
        config.request_log = file.request_log.or(config.request_log);
        config.live = file.live.unwrap_or(config.live);
        config.base_url = normalize_base_url(&config.base_url);
        Ok(config)
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base_url) = env::read_non_empty_env(BASE_URL_ENV) {
            self.base_url = normalize_base_url(&base_url);
        }
        if let Some(user_name) = env::read_non_empty_env(USER_ENV) {
            self.user_name = user_name;
        }
        if let Some(password) = env::read_non_empty_env(PASS_ENV) {
            self.password = password;
        }
        if let Some(org_name) = env::read_non_empty_env(ORG_ENV) {
            self.org_name = Some(org_name);
        }
        if let Some(db_name) = env::read_non_empty_env(DB_ENV) {
            self.db_name = Some(db_name);
        }
        if let Some(client_bin) = env::read_non_empty_env(CLIENT_BIN_ENV) {
            self.client_bin = PathBuf::from(client_bin);
        }
        if let Some(storage_dir) = env::read_non_empty_env(STORAGE_ENV) {
            self.storage_dir = PathBuf::from(storage_dir);
        }
        if let Some(timeout_ms) = env::read_env_u64(TIMEOUT_MS_ENV, 1) {
            self.timeout_ms = timeout_ms;
        }
        if let Some(request_log) = env::read_non_empty_env(REQUEST_LOG_ENV) {
            self.request_log = Some(PathBuf::from(request_log));
        }
        if let Some(live) = env::read_non_empty_env(LIVE_ENV) {
            self.live = env::parse_enabled(Some(&live));
        }
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:6363");
        assert_eq!(config.user_name, "admin");
        assert_eq!(config.password, "root");
        assert_eq!(config.org_name, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn toml_overrides_defaults_and_normalizes_base_url() {
        let config = HarnessConfig::from_toml_str(
            r#"
base_url = "http://db.test:6363/"
user_name = "tester"
org_name = "acme"
timeout_ms = 500
"#,
        )
        .expect("config");
        assert_eq!(config.base_url, "http://db.test:6363");
        assert_eq!(config.user_name, "tester");
        assert_eq!(config.password, "root");
        assert_eq!(config.org_name.as_deref(), Some("acme"));
        assert_eq!(config.timeout_ms, 500);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = HarnessConfig::from_toml_str("base_ur = \"x\"").expect_err("typo");
        assert!(matches!(err, ContractError::Config(_)));
    }

    #[test]
    fn toml_rejects_zero_timeout() {
        let err = HarnessConfig::from_toml_str("timeout_ms = 0").expect_err("zero");
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn read_toml_file_keeps_file_values_without_environment() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("harness.toml");
        std::fs::write(&path, "storage_dir = \"scratch\"\n").expect("write");
        let config = HarnessConfig::read_toml_file(&path).expect("config");
        assert_eq!(config.storage_dir, PathBuf::from("scratch"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let missing = HarnessConfig::read_toml_file(&temp.path().join("absent.toml"));
        assert!(matches!(missing, Err(ContractError::Io(_))));
    }

    #[test]
    fn from_toml_file_layers_environment_once_over_the_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("harness.toml");
        std::fs::write(&path, "user_name = \"file-user\"\n").expect("write");
        let layered = HarnessConfig::from_toml_file(&path).expect("config");
        let manual = HarnessConfig::read_toml_file(&path)
            .expect("config")
            .with_env_overrides();
        assert_eq!(layered, manual);
    }

    #[test]
    fn live_gate_defaults_off_and_reads_from_file() {
        assert!(!HarnessConfig::default().live);
        let config = HarnessConfig::from_toml_str("live = true").expect("config");
        assert!(config.live);
        let err = HarnessConfig::from_toml_str("live = \"sometimes\"").expect_err("type");
        assert!(matches!(err, ContractError::Config(_)));
    }
}
