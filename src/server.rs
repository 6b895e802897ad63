//! Server initialization and startup logic for BrowserFlow.

use std::sync::{Arc, OnceLock};

use anyhow::bail;
use browserflow_api::{ApiServer, AppState, InterfaceConfig};
use browserflow_config::{Config, ConfigValidator, LoggingConfig};
use browserflow_validation::SchemaRegistry;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize tracing with console and optional file output.
///
/// `RUST_LOG` takes precedence over `logging.level`. When `logging.dir`
/// is set, logs are also written there with daily rotation.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)?,
    };

    let console = if logging.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    let file = match logging.resolved_dir() {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("browserflow")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // The writer stops flushing once the guard is dropped.
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

/// Run the API server in foreground until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Starting BrowserFlow v{}", env!("CARGO_PKG_VERSION"));

    let report = ConfigValidator::validate(&config)?;
    for warning in &report.warnings {
        warn!("config {}: {}", warning.path, warning.message);
    }
    if !report.is_valid() {
        for problem in &report.errors {
            error!("config {}: {}", problem.path, problem.message);
        }
        bail!("Invalid configuration ({} error(s))", report.errors.len());
    }

    let state = Arc::new(AppState::with_variable_limit(
        config.environment,
        config.server.max_variables,
    )?);
    info!(
        operations = state.registry.operations().len(),
        "Schema registry loaded"
    );

    let interface_config = InterfaceConfig::new(config.server.host.clone(), config.server.port);
    let server = ApiServer::new(interface_config, state);

    info!("BrowserFlow ready:");
    info!("  API Server:    http://{}", server.addr());
    info!("  Environment:   {}", config.environment);

    server.run(shutdown_signal()).await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
