use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::{Value, json};
use tdb_contract_core::client::{expect_failure, expect_failure_category};
use tdb_contract_core::db::DbGuard;
use tdb_contract_core::util::{random_db_spec, random_org_name, unreachable_url, unresolvable_url};
use tdb_contract_core::{
    Agent, ApiResponse, CliDriver, ClientCommand, ClientErrorCategory, ContextOverrides,
    HarnessConfig, OutputPattern, db, document, endpoint, organization,
};

use super::support::{person_instance, person_schema};

#[derive(Debug, Serialize)]
pub(super) struct StepReport {
    step: String,
    target: String,
    status: u16,
    latency_ms: u64,
}

impl StepReport {
    fn http(step: &str, response: &ApiResponse) -> Self {
        Self {
            step: step.to_string(),
            target: response.target(),
            status: response.status(),
            latency_ms: response.latency_ms(),
        }
    }
}

/// Create → schema → instance → delete → recreate → delete, inside a fresh organization.
pub(super) fn run_roundtrip(config: &HarnessConfig) -> Result<Vec<StepReport>> {
    let org_name = config.org_name.clone().unwrap_or_else(random_org_name);
    let agent = Agent::new(config)?
        .auth()
        .with_defaults(&ContextOverrides::default().org_name(org_name));
    let mut steps = Vec::new();

    let created_org = config.org_name.is_none();
    if created_org {
        let response = organization::add(&agent, Value::Null)?
            .send()?
            .verify(organization::verify_add_success)
            .context("organization add")?;
        steps.push(StepReport::http("org add", &response));
    }

    let outcome = roundtrip_steps(&agent, &mut steps);

    if created_org {
        match (outcome, delete_org(&agent).context("organization delete")) {
            (Ok(()), Ok(response)) => steps.push(StepReport::http("org del", &response)),
            (Err(err), Ok(_)) | (Ok(()), Err(err)) => return Err(err),
            (Err(err), Err(cleanup)) => {
                return Err(anyhow!("{err:#}; cleanup also failed: {cleanup:#}"));
            }
        }
        return Ok(steps);
    }
    outcome.map(|()| steps)
}

fn delete_org(agent: &Agent) -> Result<ApiResponse> {
    Ok(
        organization::del(agent, json!({"organization_name": agent.org_name()}))?
            .send()?
            .verify(organization::verify_del_success)?,
    )
}

fn roundtrip_steps(agent: &Agent, steps: &mut Vec<StepReport>) -> Result<()> {
    let db_path = endpoint::db(&agent.defaults());
    let doc_path = endpoint::document(&agent.defaults());
    // Armed until the last delete, so a failed step still removes the db
    // before the organization goes.
    let mut guard = DbGuard::new(agent, &db_path);

    let response = db::create(agent, &db_path, Value::Null)?
        .send()?
        .verify(db::verify_create_success)
        .context("db create")?;
    steps.push(StepReport::http("db create", &response));

    let response = document::insert(agent, &doc_path, json!({"schema": person_schema()}))?
        .send()?
        .verify(document::verify_insert_success)
        .context("schema insert")?;
    steps.push(StepReport::http("schema insert", &response));

    let response = document::insert(agent, &doc_path, json!({"instance": person_instance()}))?
        .send()?
        .verify(document::verify_insert_success)
        .context("instance insert")?;
    steps.push(StepReport::http("instance insert", &response));

    for step in ["db delete", "db recreate", "db delete again"] {
        let verified = match step {
            "db recreate" => db::create(agent, &db_path, Value::Null)?
                .send()?
                .verify(db::verify_create_success),
            _ => db::del(agent, &db_path, Value::Null)?
                .send()?
                .verify(db::verify_delete_success),
        };
        let response = verified.context(step)?;
        steps.push(StepReport::http(step, &response));
    }
    guard.disarm();
    Ok(())
}

#[derive(Debug, Serialize)]
pub(super) struct ClientCheck {
    command: String,
    exit_code: Option<i32>,
    stderr: String,
}

/// Unknown-database failures for pull, push and `remote list`, then clone against
/// a refused and an unresolvable target, each clone run twice.
pub(super) fn run_client_errors(
    config: &HarnessConfig,
    workdir: Option<PathBuf>,
) -> Result<Vec<ClientCheck>> {
    let mut driver = CliDriver::new(config);
    if let Some(dir) = workdir {
        driver = driver.with_working_dir(dir);
    }
    let _storage = driver.storage_guard();
    driver.store_init(true).context("store init")?;

    let mut checks = Vec::new();
    let unknown_db_commands = [
        driver.authenticated(&["pull"]),
        driver.authenticated(&["push"]),
        ClientCommand::new(&["remote", "list"]),
    ];
    for command in unknown_db_commands {
        let spec = random_db_spec();
        let pattern = OutputPattern::unknown_database(&spec)?;
        let output = driver
            .run(&command.target(spec))?
            .verify(|output| expect_failure(output, &pattern))?;
        checks.push(ClientCheck {
            command: output.command_line().to_string(),
            exit_code: output.exit_code(),
            stderr: output.stderr().trim_end().to_string(),
        });
    }

    let refused = OutputPattern::connection_refused()?;
    for (target, exact) in [(unreachable_url(), true), (unresolvable_url(), false)] {
        let command = driver.authenticated(&["clone"]).target(target);
        for _ in 0..2 {
            let output = driver.run(&command)?.verify(|output| {
                if exact {
                    expect_failure(output, &refused)
                } else {
                    expect_failure_category(output, ClientErrorCategory::SocketError)
                }
            })?;
            checks.push(ClientCheck {
                command: output.command_line().to_string(),
                exit_code: output.exit_code(),
                stderr: output.stderr().trim_end().to_string(),
            });
        }
    }
    Ok(checks)
}
