//! Connection defaults, authentication and inert request construction.

use std::time::Instant;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::config::{DEFAULT_BASE_URL, DEFAULT_PASSWORD, HarnessConfig, normalize_base_url};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::request_log::RequestLog;
use crate::response::ApiResponse;
use crate::util::{random_db_name, random_org_name, random_user_name};

/// Effective connection context for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub base_url: String,
    pub org_name: String,
    pub db_name: String,
    pub user_name: String,
    pub password: String,
}

/// Call-site overrides; unset fields fall back to the agent's stored context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    pub base_url: Option<String>,
    pub org_name: Option<String>,
    pub db_name: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

impl ContextOverrides {
    #[must_use]
    pub fn org_name(mut self, value: impl Into<String>) -> Self {
        self.org_name = Some(value.into());
        self
    }

    #[must_use]
    pub fn db_name(mut self, value: impl Into<String>) -> Self {
        self.db_name = Some(value.into());
        self
    }

    #[must_use]
    pub fn user_name(mut self, value: impl Into<String>) -> Self {
        self.user_name = Some(value.into());
        self
    }

    #[must_use]
    pub fn password(mut self, value: impl Into<String>) -> Self {
        self.password = Some(value.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }
}

impl Context {
    /// Override wins, then the stored value. Name-like fields empty everywhere get a
    /// fresh random identifier; base URL and password fall back to fixed defaults.
    #[must_use]
    pub fn merged(&self, overrides: &ContextOverrides) -> Self {
        Self {
            base_url: normalize_base_url(&pick(
                overrides.base_url.as_deref(),
                &self.base_url,
                || DEFAULT_BASE_URL.to_string(),
            )),
            org_name: pick(overrides.org_name.as_deref(), &self.org_name, random_org_name),
            db_name: pick(overrides.db_name.as_deref(), &self.db_name, random_db_name),
            user_name: pick(
                overrides.user_name.as_deref(),
                &self.user_name,
                random_user_name,
            ),
            password: pick(overrides.password.as_deref(), &self.password, || {
                DEFAULT_PASSWORD.to_string()
            }),
        }
    }
}

fn pick(overridden: Option<&str>, stored: &str, fallback: impl FnOnce() -> String) -> String {
    match overridden.filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None if !stored.is_empty() => stored.to_string(),
        None => fallback(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    None,
    /// User name and password from the agent's context.
    Basic,
    Token(String),
}

/// Credentials resolved onto a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    None,
    Basic { user_name: String, password: String },
    Bearer(String),
}

#[derive(Clone)]
pub struct Agent {
    context: Context,
    auth: AuthMode,
    http: Client,
    request_log: Option<RequestLog>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("base_url", &self.context.base_url)
            .field("org_name", &self.context.org_name)
            .field("db_name", &self.context.db_name)
            .field("user_name", &self.context.user_name)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        let stored = Context {
            base_url: config.base_url.clone(),
            org_name: config.org_name.clone().unwrap_or_default(),
            db_name: config.db_name.clone().unwrap_or_default(),
            user_name: config.user_name.clone(),
            password: config.password.clone(),
        };
        Ok(Self {
            // Resolve once here so every call from this agent shares the same names.
            context: stored.merged(&ContextOverrides::default()),
            auth: AuthMode::None,
            http,
            request_log: config.request_log.clone().map(RequestLog::new),
        })
    }

    /// Basic auth with the context's user and password.
    #[must_use]
    pub fn auth(self) -> Self {
        self.with_auth(AuthMode::Basic)
    }

    #[must_use]
    pub fn with_auth(mut self, mode: AuthMode) -> Self {
        self.auth = mode;
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, overrides: &ContextOverrides) -> Self {
        self.context = self.context.merged(overrides);
        self
    }

    #[must_use]
    pub fn with_request_log(mut self, log: RequestLog) -> Self {
        self.request_log = Some(log);
        self
    }

    #[must_use]
    pub fn defaults(&self) -> Context {
        self.context.clone()
    }

    #[must_use]
    pub fn defaults_with(&self, overrides: &ContextOverrides) -> Context {
        self.context.merged(overrides)
    }

    #[must_use]
    pub fn org_name(&self) -> &str {
        &self.context.org_name
    }

    #[must_use]
    pub fn db_name(&self) -> &str {
        &self.context.db_name
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.context.user_name
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.context.base_url
    }

    #[must_use]
    pub const fn auth_mode(&self) -> &AuthMode {
        &self.auth
    }

    #[must_use]
    pub fn get(&self, endpoint: &Endpoint) -> PendingRequest {
        self.request(Method::GET, endpoint)
    }

    #[must_use]
    pub fn post(&self, endpoint: &Endpoint) -> PendingRequest {
        self.request(Method::POST, endpoint)
    }

    #[must_use]
    pub fn put(&self, endpoint: &Endpoint) -> PendingRequest {
        self.request(Method::PUT, endpoint)
    }

    #[must_use]
    pub fn delete(&self, endpoint: &Endpoint) -> PendingRequest {
        self.request(Method::DELETE, endpoint)
    }

    #[must_use]
    pub fn head(&self, endpoint: &Endpoint) -> PendingRequest {
        self.request(Method::HEAD, endpoint)
    }

    fn credentials(&self) -> Credentials {
        match &self.auth {
            AuthMode::None => Credentials::None,
            AuthMode::Basic => Credentials::Basic {
                user_name: self.context.user_name.clone(),
                password: self.context.password.clone(),
            },
            AuthMode::Token(token) => Credentials::Bearer(token.clone()),
        }
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> PendingRequest {
        PendingRequest {
            url: format!("{}{}", self.context.base_url, endpoint.path()),
            path: endpoint.path().to_string(),
            query: endpoint.query().to_vec(),
            method,
            credentials: self.credentials(),
            body: None,
            http: self.http.clone(),
            request_log: self.request_log.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Raw { content_type: String, text: String },
}

/// A fully described request that has not been sent. Nothing touches the network
/// until [`PendingRequest::send`].
#[derive(Clone)]
pub struct PendingRequest {
    method: Method,
    url: String,
    path: String,
    query: Vec<(String, String)>,
    credentials: Credentials,
    body: Option<RequestBody>,
    http: Client,
    request_log: Option<RequestLog>,
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl PendingRequest {
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Literal body sent as `application/json` without being parsed.
    #[must_use]
    pub fn raw_json(self, text: impl Into<String>) -> Self {
        self.raw("application/json", text)
    }

    #[must_use]
    pub fn raw(mut self, content_type: &str, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.to_string(),
            text: text.into(),
        });
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Base URL and path; query pairs are encoded by [`PendingRequest::build`].
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// `VERB /path`, used in logs and verification messages.
    #[must_use]
    pub fn operation(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn build(&self) -> Result<reqwest::blocking::Request> {
        let mut builder = self
            .http
            .request(self.method.clone(), &self.url)
            .query(&self.query);
        builder = match &self.credentials {
            Credentials::None => builder,
            Credentials::Basic {
                user_name,
                password,
            } => builder.basic_auth(user_name, Some(password)),
            Credentials::Bearer(token) => builder.bearer_auth(token),
        };
        builder = match &self.body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Raw { content_type, text }) => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(text.clone()),
        };
        Ok(builder.build()?)
    }

    /// Dispatches the request. Any HTTP status is a response; only transport
    /// failures are errors.
    pub fn send(self) -> Result<ApiResponse> {
        let operation = self.operation();
        let started = Instant::now();
        let mut target = self.url.clone();
        let outcome = self
            .build()
            .and_then(|request| {
                target = request.url().to_string();
                Ok(self.http.execute(request)?)
            })
            .and_then(|response| {
                ApiResponse::read(self.method.as_str(), &self.path, response, started)
            });

        if let Some(log) = &self.request_log {
            match &outcome {
                Ok(response) => {
                    log.log_ok(&operation, started.elapsed(), Some(response.status()), &target);
                }
                Err(err) => log.log_error(&operation, started.elapsed(), &target, err),
            }
        }
        outcome
    }
}
