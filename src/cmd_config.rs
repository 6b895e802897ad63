//! Configuration check command.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::bail;
use browserflow_config::{Config, ConfigValidator, ValidationResult};

pub(crate) fn check_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;
    print!("{}", render_report(path, config, &result));

    if !result.is_valid() {
        bail!("Configuration has {} error(s)", result.errors.len());
    }
    Ok(())
}

fn render_report(path: &Path, config: &Config, result: &ValidationResult) -> String {
    let mut out = String::new();
    let source = if path.exists() { "" } else { " (not found, using defaults)" };
    let _ = writeln!(out, "Config:      {}{}", path.display(), source);
    let _ = writeln!(out, "Environment: {}", config.environment);
    let _ = writeln!(out, "Listen:      {}:{}", config.server.host, config.server.port);
    let _ = writeln!(out, "Log level:   {}", config.logging.level);

    for warning in &result.warnings {
        let _ = writeln!(out, "warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        let _ = writeln!(out, "error: {}: {}", error.path, error.message);
    }
    if result.is_valid() {
        let _ = writeln!(out, "Configuration OK");
    }
    out
}
