//! Validation error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composite::Section;
use crate::schema::{PathSegment, SchemaViolation};

/// Status code carried by every request validation failure.
pub const VALIDATION_STATUS: u16 = 400;

/// Generic top-level message of a request validation failure.
pub const VALIDATION_MESSAGE: &str = "Error de validación en los datos de la solicitud.";

/// One invalid or missing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorDetail {
    pub field: String,
    pub message: String,
}

impl FieldErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a detail from a violation found under `section`.
    ///
    /// The field is the leaf key below the section; array indices are
    /// skipped. A violation on the section itself falls back to the
    /// section name.
    pub(crate) fn from_violation(section: Section, violation: &SchemaViolation) -> Self {
        let field = violation
            .path
            .iter()
            .skip(1)
            .rev()
            .find_map(|segment| match segment {
                PathSegment::Key(key) => Some(key.clone()),
                PathSegment::Index(_) => None,
            })
            .unwrap_or_else(|| section.as_str().to_string());
        Self {
            field,
            message: strip_quotes(&violation.message),
        }
    }
}

fn strip_quotes(message: &str) -> String {
    message.replace('"', "")
}

/// A request that failed validation in one or more configured sections.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ValidationError {
    pub status_code: u16,
    pub message: String,
    pub details: Vec<FieldErrorDetail>,
}

impl ValidationError {
    pub fn new(details: Vec<FieldErrorDetail>) -> Self {
        Self {
            status_code: VALIDATION_STATUS,
            message: VALIDATION_MESSAGE.to_string(),
            details,
        }
    }

    /// Field names in reporting order.
    pub fn fields(&self) -> Vec<&str> {
        self.details.iter().map(|d| d.field.as_str()).collect()
    }
}

/// A schema that cannot be used, detected when a validator is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaDefinitionError {
    #[error("field '{field}' has a condition on undeclared sibling '{sibling}'")]
    UnknownSibling { field: String, sibling: String },

    #[error("field '{field}' has an invalid pattern /{pattern}/: {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("default of field '{field}' violates its own rule: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("field '{field}' has min {min} greater than max {max}")]
    InvertedBounds { field: String, min: f64, max: f64 },

    #[error("field '{field}' declares an empty set of valid values")]
    EmptyValidSet { field: String },
}

/// Schema registry failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("no schema registered for operation '{0}'")]
    NotFound(String),

    #[error("operation '{0}' is already registered")]
    Duplicate(String),

    #[error("invalid schema for operation '{operation}': {source}")]
    InvalidSchema {
        operation: String,
        #[source]
        source: SchemaDefinitionError,
    },
}
