use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::ProbeArg;

#[derive(Debug, Args)]
pub struct BenchArgs {
    #[arg(long, default_value_t = 10)]
    pub iterations: usize,
    /// Also write the samples to this file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    #[command(subcommand)]
    pub command: BenchCommand,
}

#[derive(Debug, Subcommand)]
pub enum BenchCommand {
    /// First instance insert into a database that only holds a schema.
    DocumentInsert {
        /// Variant segment of the sample name.
        #[arg(long, default_value = "person")]
        variant: String,
        #[arg(long, value_name = "FILE", requires = "instance")]
        schema: Option<PathBuf>,
        #[arg(long, value_name = "FILE", requires = "schema")]
        instance: Option<PathBuf>,
    },
    DbCreate {
        /// Send the default prefix map with every create.
        #[arg(long, default_value_t = false)]
        prefixes: bool,
    },
    DbDelete,
    Probe {
        #[arg(value_enum)]
        probe: ProbeArg,
    },
}
