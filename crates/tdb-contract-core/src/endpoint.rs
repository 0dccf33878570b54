//! Path grammar for each API resource family.
//!
//! Every function here is pure: the same context always yields the same path.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agent::Context;
use crate::error::{ContractError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Db,
    Document,
    Organization,
    Branch,
    Remote,
    Woql,
    Triples,
    Info,
    Ok,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::Document => "document",
            Self::Organization => "organization",
            Self::Branch => "branch",
            Self::Remote => "remote",
            Self::Woql => "woql",
            Self::Triples => "triples",
            Self::Info => "info",
            Self::Ok => "ok",
        }
    }

    /// `/api/{resource}` without any org/db parameters; benchmark samples group by it.
    #[must_use]
    pub fn base_path(&self) -> String {
        format!("/api/{}", self.as_str())
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    Schema,
    Instance,
}

impl GraphType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Instance => "instance",
        }
    }
}

impl Display for GraphType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "schema" => Ok(Self::Schema),
            "instance" => Ok(Self::Instance),
            _ => Err(ContractError::TypeMismatch {
                name: "graph_type".to_string(),
                expected: "\"schema\" or \"instance\"",
                actual: format!("{s:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    kind: ResourceKind,
    path: String,
    query: Vec<(String, String)>,
}

impl Endpoint {
    fn new(kind: ResourceKind, path: String) -> Self {
        Self {
            kind,
            path,
            query: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

#[must_use]
pub fn db(context: &Context) -> Endpoint {
    Endpoint::new(
        ResourceKind::Db,
        format!("/api/db/{}/{}", context.org_name, context.db_name),
    )
}

#[must_use]
pub fn document(context: &Context) -> Endpoint {
    Endpoint::new(
        ResourceKind::Document,
        format!("/api/document/{}/{}", context.org_name, context.db_name),
    )
}

/// Flat: the organization name travels in the request body.
#[must_use]
pub fn organization() -> Endpoint {
    Endpoint::new(ResourceKind::Organization, "/api/organization".to_string())
}

#[must_use]
pub fn branch(context: &Context, branch_name: &str) -> Endpoint {
    Endpoint::new(
        ResourceKind::Branch,
        format!(
            "/api/branch/{}/{}/local/branch/{branch_name}",
            context.org_name, context.db_name
        ),
    )
}

#[must_use]
pub fn remote(context: &Context) -> Endpoint {
    Endpoint::new(
        ResourceKind::Remote,
        format!("/api/remote/{}/{}", context.org_name, context.db_name),
    )
}

#[must_use]
pub fn woql(context: &Context) -> Endpoint {
    Endpoint::new(
        ResourceKind::Woql,
        format!("/api/woql/{}/{}", context.org_name, context.db_name),
    )
}

#[must_use]
pub fn triples(context: &Context, branch_name: &str, graph: GraphType) -> Endpoint {
    Endpoint::new(
        ResourceKind::Triples,
        format!(
            "/api/triples/{}/{}/local/branch/{branch_name}/{graph}",
            context.org_name, context.db_name
        ),
    )
}

#[must_use]
pub fn info() -> Endpoint {
    Endpoint::new(ResourceKind::Info, "/api/info".to_string())
}

#[must_use]
pub fn ok() -> Endpoint {
    Endpoint::new(ResourceKind::Ok, "/api/ok".to_string())
}
