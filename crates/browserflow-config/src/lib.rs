//! # BrowserFlow Config
//!
//! Configuration management for the BrowserFlow backend.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_OVERRIDE_VAR};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
