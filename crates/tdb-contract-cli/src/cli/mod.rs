use clap::{Parser, Subcommand};

mod args;
mod bench;


pub use args::{
    CheckArgs, ClientErrorsArgs, DbArgs, DbCommand, GlobalArgs, OrgArgs, OrgCommand, ProbeArg,
};
pub use bench::{BenchArgs, BenchCommand};

#[derive(Debug, Parser)]
#[command(name = "tdb-contract")]
#[command(
    about = "Contract checks for a document-database HTTP API and its command-line client",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the effective configuration.
    Config,
    Org(OrgArgs),
    Db(DbArgs),
    /// Probe `/api/ok` or `/api/info`.
    Check(CheckArgs),
    /// Create a database, insert a schema and an instance, delete and recreate it.
    Roundtrip,
    /// Run the client binary against unknown databases and unreachable clone targets.
    ClientErrors(ClientErrorsArgs),
    Bench(BenchArgs),
}
