use anyhow::{Context, Result};
use serde_json::{Value, json};
use tdb_contract_core::bench::{self, DbCreate, DbDelete, DocumentInsertFirst, EndpointProbe, Probe};
use tdb_contract_core::{Agent, HarnessConfig, db, endpoint, organization, system};

use crate::cli::{
    BenchArgs, BenchCommand, Cli, Commands, DbCommand, GlobalArgs, OrgCommand, ProbeArg,
};

mod scenarios;
mod support;

use self::scenarios::{run_client_errors, run_roundtrip};
use self::support::{
    default_prefixes, person_instance, person_schema, print_json, read_json_file,
    response_summary,
};

pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.global)?;
    match cli.command {
        Commands::Config => print_json(&config_summary(&config)),
        Commands::Org(args) => {
            let agent = Agent::new(&config)?.auth();
            let request = match args.command {
                OrgCommand::Add { name, owner } => {
                    let mut params = serde_json::Map::new();
                    if let Some(name) = name {
                        params.insert("organization_name".to_string(), Value::String(name));
                    }
                    if let Some(owner) = owner {
                        params.insert("user_name".to_string(), Value::String(owner));
                    }
                    organization::add(&agent, Value::Object(params))?
                }
                OrgCommand::Del { name } => {
                    organization::del(&agent, json!({"organization_name": name}))?
                }
            };
            print_json(&response_summary(&request.send()?))
        }
        Commands::Db(args) => {
            let agent = Agent::new(&config)?.auth();
            let target = endpoint::db(&agent.defaults());
            let request = match args.command {
                DbCommand::Create {
                    label,
                    comment,
                    public,
                    no_schema,
                    prefixes,
                } => {
                    let mut params = json!({"public": public, "schema": !no_schema});
                    if let Some(label) = label {
                        params["label"] = Value::String(label);
                    }
                    if let Some(comment) = comment {
                        params["comment"] = Value::String(comment);
                    }
                    if let Some(path) = prefixes {
                        params["prefixes"] = read_json_file(&path)?;
                    }
                    db::create(&agent, &target, params)?
                }
                DbCommand::Delete { force } => db::del(&agent, &target, json!({"force": force}))?,
                DbCommand::Exists => db::exists(&agent, &target),
            };
            print_json(&response_summary(&request.send()?))
        }
        Commands::Check(args) => {
            let agent = Agent::new(&config)?.auth();
            let response = match args.probe {
                ProbeArg::Ok => system::ok(&agent).send()?.verify(system::verify_ok)?,
                ProbeArg::Info => system::info(&agent)
                    .send()?
                    .verify(system::verify_info_success)?,
            };
            print_json(&response_summary(&response))
        }
        Commands::Roundtrip => print_json(&run_roundtrip(&config)?),
        Commands::ClientErrors(args) => {
            let mut config = config;
            if let Some(client_bin) = args.client_bin {
                config.client_bin = client_bin;
            }
            print_json(&run_client_errors(&config, args.workdir)?)
        }
        Commands::Bench(args) => run_bench(&config, args),
    }
}

/// Defaults < `--config` file < environment < flags.
fn load_config(global: &GlobalArgs) -> Result<HarnessConfig> {
    let mut config = match &global.config {
        Some(path) => HarnessConfig::read_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HarnessConfig::default(),
    }
    .with_env_overrides();

    if let Some(base_url) = &global.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(user) = &global.user {
        config.user_name.clone_from(user);
    }
    if let Some(password) = &global.password {
        config.password.clone_from(password);
    }
    if let Some(org) = &global.org {
        config.org_name = Some(org.clone());
    }
    if let Some(db) = &global.db {
        config.db_name = Some(db.clone());
    }
    Ok(config)
}

fn config_summary(config: &HarnessConfig) -> Value {
    json!({
        "base_url": config.base_url,
        "user_name": config.user_name,
        "password": "***",
        "org_name": config.org_name,
        "db_name": config.db_name,
        "client_bin": config.client_bin.display().to_string(),
        "storage_dir": config.storage_dir.display().to_string(),
        "timeout_ms": config.timeout_ms,
        "request_log": config.request_log.as_ref().map(|p| p.display().to_string()),
        "live": config.live,
    })
}

fn run_bench(config: &HarnessConfig, args: BenchArgs) -> Result<()> {
    let agent = Agent::new(config)?.auth();
    let sample = match args.command {
        BenchCommand::DocumentInsert {
            variant,
            schema,
            instance,
        } => {
            let (schema, instance) = match (schema, instance) {
                (Some(schema), Some(instance)) => {
                    (read_json_file(&schema)?, read_json_file(&instance)?)
                }
                _ => (person_schema(), person_instance()),
            };
            let mut scenario = DocumentInsertFirst::new(agent, variant, schema, instance);
            bench::measure(&mut scenario, args.iterations)?
        }
        BenchCommand::DbCreate { prefixes } => {
            let prefixes = prefixes.then(default_prefixes);
            bench::measure(&mut DbCreate::new(agent, prefixes), args.iterations)?
        }
        BenchCommand::DbDelete => bench::measure(&mut DbDelete::new(agent), args.iterations)?,
        BenchCommand::Probe { probe } => {
            let probe = match probe {
                ProbeArg::Ok => Probe::Ok,
                ProbeArg::Info => Probe::Info,
            };
            bench::measure(&mut EndpointProbe::new(agent, probe), args.iterations)?
        }
    };

    let samples = vec![sample];
    if let Some(path) = &args.output {
        std::fs::write(path, bench::samples_to_json(&samples)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    print_json(&samples)
}
