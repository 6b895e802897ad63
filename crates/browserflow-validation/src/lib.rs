//! # BrowserFlow Validation
//!
//! Request validation core for the BrowserFlow backend.
//!
//! - [`SectionSchema`] / [`FieldRule`]: declarative contracts for one
//!   request section (body, path params or query), with defaults, allowed
//!   sets, bounds, patterns and conditional rules between sibling fields.
//! - [`ValidationConfig`]: the schemas a route configures, at most one per
//!   section.
//! - [`Validator`]: validates the configured sections of a
//!   [`RequestSections`] in one pass and sanitizes them in place, or
//!   returns a [`ValidationError`] listing every invalid field.
//! - [`SchemaRegistry`]: lookup of configurations by operation name.
//!
//! Everything here is synchronous and free of I/O. Schemas are immutable
//! once built and safe to share between threads.

mod composite;
mod definition;
mod error;
mod registry;
mod schema;
mod validator;

pub use composite::{RequestSections, Section, ValidationConfig};
pub use error::{
    FieldErrorDetail, RegistryError, SchemaDefinitionError, ValidationError, VALIDATION_MESSAGE,
    VALIDATION_STATUS,
};
pub use registry::{SchemaRegistry, StaticSchemaRegistry};
pub use schema::{
    Condition, FieldKind, FieldRule, PathSegment, Pattern, Presence, SchemaViolation, SectionSchema,
};
pub use validator::Validator;
