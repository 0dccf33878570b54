//! Latency sampling in the shape of the benchmark tracker's `generic` tool.
//!
//! A [`Scenario`] prepares fixtures in `before_each`, does the measured work in
//! `run` and cleans up in `after_each`. Only `run` is timed, and the p90 of the
//! collected durations becomes one [`TimingSample`] named
//! `<path>:<variant>:<VERB>:http_req_duration:p(90)`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::agent::{Agent, PendingRequest};
use crate::endpoint::{self, Endpoint, ResourceKind};
use crate::error::{ContractError, Result};
use crate::resource::{db, document, system};
use crate::response::ApiResponse;

pub const METRIC: &str = "http_req_duration";
pub const P90: f64 = 90.0;
pub const UNIT_MS: &str = "ms";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

impl TimingSample {
    #[must_use]
    pub fn millis(name: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            name: name.into(),
            value: (duration_ms * 1000.0).round() / 1000.0,
            unit: UNIT_MS.to_string(),
        }
    }
}

#[must_use]
pub fn sample_name(path: &str, variant: &str, method: &str) -> String {
    format!(
        "{path}:{variant}:{}:{METRIC}:p(90)",
        method.to_ascii_uppercase()
    )
}

/// Nearest-rank percentile, `p` in `0..=100`. `None` for an empty slice.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let len = sorted.len();
    let rank = ((p.clamp(0.0, 100.0) / 100.0) * len as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, len) - 1])
}

pub fn samples_to_json(samples: &[TimingSample]) -> Result<String> {
    Ok(serde_json::to_string_pretty(samples)?)
}

pub trait Scenario {
    /// Sample name; see [`sample_name`].
    fn name(&self) -> String;

    fn before_each(&mut self) -> Result<()> {
        Ok(())
    }

    fn run(&mut self) -> Result<()>;

    fn after_each(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One iteration. `after_each` runs even when setup or the measured step fails;
/// the first error wins.
pub fn run_once(scenario: &mut dyn Scenario) -> Result<Duration> {
    let measured = scenario.before_each().and_then(|()| {
        let started = Instant::now();
        scenario.run().map(|()| started.elapsed())
    });
    let teardown = scenario.after_each();
    let elapsed = measured?;
    teardown?;
    Ok(elapsed)
}

pub fn measure(scenario: &mut dyn Scenario, iterations: usize) -> Result<TimingSample> {
    if iterations == 0 {
        return Err(ContractError::InvalidParams(
            "iterations must be at least 1".to_string(),
        ));
    }
    let mut durations_ms = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        durations_ms.push(run_once(scenario)?.as_secs_f64() * 1000.0);
    }
    let p90 = percentile(&durations_ms, P90).unwrap_or_default();
    Ok(TimingSample::millis(scenario.name(), p90))
}

/// Creates the database and inserts the schema, then measures the first instance insert.
#[derive(Debug)]
pub struct DocumentInsertFirst {
    agent: Agent,
    variant: String,
    schema: Value,
    instance: Value,
    pending: Option<PendingRequest>,
    response: Option<ApiResponse>,
}

impl DocumentInsertFirst {
    #[must_use]
    pub fn new(agent: Agent, variant: impl Into<String>, schema: Value, instance: Value) -> Self {
        Self {
            agent,
            variant: variant.into(),
            schema,
            instance,
            pending: None,
            response: None,
        }
    }

    fn db_endpoint(&self) -> Endpoint {
        endpoint::db(&self.agent.defaults())
    }

    fn document_endpoint(&self) -> Endpoint {
        endpoint::document(&self.agent.defaults())
    }
}

impl Scenario for DocumentInsertFirst {
    fn name(&self) -> String {
        sample_name(&ResourceKind::Document.base_path(), &self.variant, "POST")
    }

    fn before_each(&mut self) -> Result<()> {
        db::create(&self.agent, &self.db_endpoint(), Value::Null)?
            .send()?
            .verify(db::verify_create_success)?;
        document::insert(
            &self.agent,
            &self.document_endpoint(),
            json!({"schema": self.schema}),
        )?
        .send()?
        .verify(document::verify_insert_success)?;
        self.pending = Some(document::insert(
            &self.agent,
            &self.document_endpoint(),
            json!({"instance": self.instance}),
        )?);
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        let request = self.pending.take().ok_or_else(|| {
            ContractError::Assertion("no prepared request; before_each did not run".to_string())
        })?;
        self.response = Some(request.send()?);
        Ok(())
    }

    fn after_each(&mut self) -> Result<()> {
        self.pending = None;
        db::del(&self.agent, &self.db_endpoint(), Value::Null)?
            .send()?
            .verify(db::verify_delete_success)?;
        if let Some(response) = self.response.take() {
            document::verify_insert_success(response)?;
        }
        Ok(())
    }
}

/// Measures database creation; the database is deleted again after each iteration.
#[derive(Debug)]
pub struct DbCreate {
    agent: Agent,
    prefixes: Option<Map<String, Value>>,
}

impl DbCreate {
    #[must_use]
    pub fn new(agent: Agent, prefixes: Option<Map<String, Value>>) -> Self {
        Self { agent, prefixes }
    }

    fn db_endpoint(&self) -> Endpoint {
        endpoint::db(&self.agent.defaults())
    }
}

impl Scenario for DbCreate {
    fn name(&self) -> String {
        let variant = if self.prefixes.is_some() { "prefixes" } else { "" };
        sample_name(&ResourceKind::Db.base_path(), variant, "POST")
    }

    fn run(&mut self) -> Result<()> {
        let options = db::CreateDb::Fields {
            label: db::DEFAULT_LABEL.to_string(),
            comment: db::DEFAULT_COMMENT.to_string(),
            public: false,
            schema: true,
            prefixes: self.prefixes.clone(),
        };
        db::create_with(&self.agent, &self.db_endpoint(), &options)?
            .send()?
            .verify(db::verify_create_success)?;
        Ok(())
    }

    fn after_each(&mut self) -> Result<()> {
        db::del(&self.agent, &self.db_endpoint(), Value::Null)?
            .send()?
            .verify(db::verify_delete_success)?;
        Ok(())
    }
}

/// Measures database deletion; the database is created before each iteration.
#[derive(Debug)]
pub struct DbDelete {
    agent: Agent,
}

impl DbDelete {
    #[must_use]
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Scenario for DbDelete {
    fn name(&self) -> String {
        sample_name(&ResourceKind::Db.base_path(), "", "DELETE")
    }

    fn before_each(&mut self) -> Result<()> {
        db::create(&self.agent, &endpoint::db(&self.agent.defaults()), Value::Null)?
            .send()?
            .verify(db::verify_create_success)?;
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        db::del(&self.agent, &endpoint::db(&self.agent.defaults()), Value::Null)?
            .send()?
            .verify(db::verify_delete_success)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Ok,
    Info,
}

/// Fixture-free GET against `/api/ok` or `/api/info`.
#[derive(Debug)]
pub struct EndpointProbe {
    agent: Agent,
    probe: Probe,
}

impl EndpointProbe {
    #[must_use]
    pub fn new(agent: Agent, probe: Probe) -> Self {
        Self { agent, probe }
    }
}

impl Scenario for EndpointProbe {
    fn name(&self) -> String {
        let kind = match self.probe {
            Probe::Ok => ResourceKind::Ok,
            Probe::Info => ResourceKind::Info,
        };
        sample_name(&kind.base_path(), "", "GET")
    }

    fn run(&mut self) -> Result<()> {
        match self.probe {
            Probe::Ok => system::ok(&self.agent).send()?.verify(system::verify_ok)?,
            Probe::Info => system::info(&self.agent)
                .send()?
                .verify(system::verify_info_success)?,
        };
        Ok(())
    }
}
