//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();
        Self::validate_server(config, &mut result);
        Self::validate_logging(config, &mut result);
        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.trim().is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.max_variables == 0 {
            result.add_error(ValidationError::new(
                "server.max_variables",
                "At least one flow variable must be allowed",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        } else if config.environment.is_production() && matches!(level.as_str(), "trace" | "debug") {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!("'{}' logging in production may expose request data", level),
            ));
        }

        if let Some(dir) = config.logging.resolved_dir() {
            if dir.as_os_str().is_empty() {
                result.add_error(ValidationError::new(
                    "logging.dir",
                    "Log directory cannot be empty",
                ));
            } else if dir.is_file() {
                result.add_error(ValidationError::new(
                    "logging.dir",
                    format!("Log directory is a file: {:?}", dir),
                ));
            } else if !dir.exists() {
                result.add_warning(ValidationWarning::new(
                    "logging.dir",
                    format!("Log directory does not exist and will be created: {:?}", dir),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
