//! BrowserFlow - backend for the visual browser-automation builder
//!
//! Main entry point for the BrowserFlow CLI and API server.

mod cli;
mod cmd_config;
mod cmd_schemas;
mod server;

use std::path::PathBuf;

use anyhow::Context;
use browserflow_config::ConfigLoader;
use clap::Parser;

use crate::cli::{Cli, Commands};

/// Default config location: `<config dir>/browserflow/config.toml`.
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("browserflow"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = ConfigLoader::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    ConfigLoader::apply_environment(&mut config, cli.env)?;

    match cli.command {
        None => {
            server::init_tracing(&config.logging)?;
            server::run_server(config).await?;
        }
        Some(Commands::Run { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::init_tracing(&config.logging)?;
            server::run_server(config).await?;
        }
        Some(Commands::CheckConfig) => {
            cmd_config::check_config(&config_path, &config)?;
        }
        Some(Commands::Schemas { format }) => {
            cmd_schemas::print_schemas(format)?;
        }
    }

    Ok(())
}
