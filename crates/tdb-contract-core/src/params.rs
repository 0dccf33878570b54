//! Loosely-typed test parameters with typed, consuming accessors.
//!
//! A [`Params`] is built from the ad hoc JSON object a test passes to a request
//! builder. Every accessor removes its key from the pending set, and
//! [`Params::assert_empty`] consumes the value and rejects whatever is left, so a
//! misspelled option fails before any request is built.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::{ContractError, Result};

#[derive(Debug, Clone, Default)]
pub struct Params {
    values: Map<String, Value>,
    pending: BTreeSet<String>,
}

impl Params {
    /// `Value::Null` means "no configuration". Anything other than an object is rejected.
    pub fn new(config: Value) -> Result<Self> {
        match config {
            Value::Null => Ok(Self::default()),
            Value::Object(values) => {
                let pending = values.keys().cloned().collect();
                Ok(Self { values, pending })
            }
            other => Err(ContractError::InvalidParams(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        self.pending.iter().cloned().collect()
    }

    fn take(&mut self, name: &str) -> Option<&Value> {
        self.pending.remove(name);
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn string(&mut self, name: &str) -> Result<Option<String>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(mismatch(name, "string", other)),
        }
    }

    pub fn string_or(&mut self, name: &str, default: impl Into<String>) -> Result<String> {
        Ok(self.string(name)?.unwrap_or_else(|| default.into()))
    }

    pub fn bool(&mut self, name: &str) -> Result<Option<bool>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(mismatch(name, "boolean", other)),
        }
    }

    pub fn bool_or(&mut self, name: &str, default: bool) -> Result<bool> {
        Ok(self.bool(name)?.unwrap_or(default))
    }

    pub fn integer(&mut self, name: &str) -> Result<Option<u64>> {
        match self.take(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| mismatch(name, "non-negative integer", value)),
        }
    }

    /// JSON object or array, passed through as a document body.
    pub fn document(&mut self, name: &str) -> Result<Option<Value>> {
        match self.take(name) {
            None => Ok(None),
            Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(Some(value.clone())),
            Some(other) => Err(mismatch(name, "object or array", other)),
        }
    }

    pub fn object(&mut self, name: &str) -> Result<Option<Map<String, Value>>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(other) => Err(mismatch(name, "object", other)),
        }
    }

    /// Must be the last call; fails naming every key no accessor consumed.
    pub fn assert_empty(self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        Err(ContractError::UnknownParameter(
            self.pending.into_iter().collect(),
        ))
    }
}

impl TryFrom<Value> for Params {
    type Error = ContractError;

    fn try_from(value: Value) -> Result<Self> {
        Self::new(value)
    }
}

fn mismatch(name: &str, expected: &'static str, actual: &Value) -> ContractError {
    ContractError::TypeMismatch {
        name: name.to_string(),
        expected,
        actual: json_type_name(actual).to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
