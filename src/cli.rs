//! CLI definitions for BrowserFlow.

use std::path::PathBuf;

use browserflow_config::Environment;
use clap::{Parser, Subcommand, ValueEnum};

/// BrowserFlow CLI.
#[derive(Parser)]
#[command(name = "browserflow")]
#[command(about = "Backend for the BrowserFlow visual browser-automation builder")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.config/browserflow/config.toml)
    #[arg(short, long, global = true, env = "BROWSERFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Runtime environment (development, production, test)
    #[arg(short, long, global = true)]
    pub env: Option<Environment>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the API server in foreground (default)
    Run {
        /// Server host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load and validate the configuration, then exit
    CheckConfig,

    /// Print the validation schema of every registered operation
    Schemas {
        /// Output format
        #[arg(long, value_enum, default_value_t = SchemaFormat::Table)]
        format: SchemaFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SchemaFormat {
    Json,
    Table,
}
