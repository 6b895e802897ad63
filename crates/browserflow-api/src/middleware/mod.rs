//! Request middleware.

pub mod validate;

pub use validate::{validate_request, validated, ValidatedRequest, MAX_BODY_BYTES};
