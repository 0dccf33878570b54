use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tdb_contract_core::ApiResponse;

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub(super) fn read_json_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

pub(super) fn response_summary(response: &ApiResponse) -> Value {
    json!({
        "target": response.target(),
        "status": response.status(),
        "kind": response.kind(),
        "latency_ms": response.latency_ms(),
        "body": response.json().cloned().unwrap_or_else(|| Value::String(response.text().to_string())),
    })
}

pub(super) fn person_schema() -> Value {
    json!({"@type": "Class", "@id": "Person", "name": "xsd:string", "age": "xsd:integer"})
}

pub(super) fn person_instance() -> Value {
    json!({"@type": "Person", "name": "Ada", "age": 36})
}

pub(super) fn default_prefixes() -> Map<String, Value> {
    let mut prefixes = Map::new();
    prefixes.insert(
        "@base".to_string(),
        Value::String("terminusdb:///data/".to_string()),
    );
    prefixes.insert(
        "@schema".to_string(),
        Value::String("terminusdb:///schema#".to_string()),
    );
    prefixes
}
