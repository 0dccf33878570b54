use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Connection flags; each overrides the config file and environment.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TOML file with harness settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    #[arg(long, global = true)]
    pub user: Option<String>,
    #[arg(long, global = true)]
    pub password: Option<String>,
    /// Organization to work in; random when unset.
    #[arg(long, global = true)]
    pub org: Option<String>,
    /// Database to work on; random when unset.
    #[arg(long, global = true)]
    pub db: Option<String>,
}

#[derive(Debug, Args)]
pub struct OrgArgs {
    #[command(subcommand)]
    pub command: OrgCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    Add {
        name: Option<String>,
        /// Owner of the new organization; defaults to the connecting user.
        #[arg(long)]
        owner: Option<String>,
    },
    Del {
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    Create {
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long, default_value_t = false)]
        public: bool,
        /// Create the database without a schema graph.
        #[arg(long, default_value_t = false)]
        no_schema: bool,
        /// JSON file holding the prefix map.
        #[arg(long, value_name = "FILE")]
        prefixes: Option<PathBuf>,
    },
    Delete {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeArg {
    Ok,
    Info,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(value_enum)]
    pub probe: ProbeArg,
}

#[derive(Debug, Args)]
pub struct ClientErrorsArgs {
    /// Client binary; overrides the configured one.
    #[arg(long, value_name = "PATH")]
    pub client_bin: Option<PathBuf>,
    /// Directory to run the client in.
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,
}
