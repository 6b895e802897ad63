//! Composite request validator.
//!
//! A [`Validator`] is built once per route from a [`ValidationConfig`] and
//! then applied to every request on that route. Only the configured
//! sections take part: they are validated together in one pass, every
//! violation is collected, and on success exactly those sections are
//! replaced with their sanitized values. Nothing else on the request is
//! read or written.
//!
//! The validator never renders a response. Failures come back as a
//! [`ValidationError`] for the caller to hand to the error handler.

use serde_json::Value;
use tracing::debug;

use crate::composite::{RequestSections, Section, ValidationConfig};
use crate::definition::check_section;
use crate::error::{FieldErrorDetail, SchemaDefinitionError, ValidationError};
use crate::schema::PathSegment;

/// Validates and sanitizes the configured sections of a request.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Build a validator, rejecting malformed schema definitions.
    pub fn new(config: ValidationConfig) -> Result<Self, SchemaDefinitionError> {
        for (section, schema) in config.sections() {
            check_section(section, schema)?;
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `request` in place.
    ///
    /// On success the configured sections hold their sanitized values:
    /// defaults applied, strings coerced, undeclared keys removed. On
    /// failure the request is left untouched.
    pub fn validate(&self, request: &mut RequestSections) -> Result<(), ValidationError> {
        if self.config.is_empty() {
            return Ok(());
        }

        let mut sanitized = Vec::with_capacity(3);
        let mut details = Vec::new();

        for (section, schema) in self.config.sections() {
            let prefix = [PathSegment::Key(section.as_str().to_string())];
            match schema.validate_at(&prefix, request.get(section)) {
                Ok(clean) => sanitized.push((section, Value::Object(clean))),
                Err(violations) => details.extend(
                    violations
                        .iter()
                        .map(|violation| FieldErrorDetail::from_violation(section, violation)),
                ),
            }
        }

        if !details.is_empty() {
            debug!(fields = ?details.iter().map(|d| &d.field).collect::<Vec<_>>(), "request validation failed");
            return Err(ValidationError::new(details));
        }

        for (section, value) in sanitized {
            *request.get_mut(section) = value;
        }
        Ok(())
    }

    /// Consuming variant of [`Validator::validate`].
    pub fn sanitize(&self, mut request: RequestSections) -> Result<RequestSections, ValidationError> {
        self.validate(&mut request)?;
        Ok(request)
    }

    /// Whether `section` takes part in validation.
    pub fn covers(&self, section: Section) -> bool {
        self.config.has(section)
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
