//! Error envelope and terminal error handling.
//!
//! Handlers and middleware never write error bodies themselves. They
//! return an [`ApiError`], whose response is an empty placeholder carrying
//! the error in its extensions. [`handle_errors`] is installed outermost
//! and renders every placeholder through the [`ErrorHandler`], so each
//! error path produces the same envelope:
//!
//! ```text
//! { "success": false, "status": 400, "error": "...", "details": [...]?, "stack": "..."? }
//! ```

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{Method, StatusCode, header::ALLOW},
    middleware::Next,
    response::{IntoResponse, Response},
};
use browserflow_config::Environment;
use browserflow_validation::{FieldErrorDetail, RegistryError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Message sent for 500 responses in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor. Intente nuevamente más tarde.";

/// Message sent when an error carries no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Error desconocido del servidor.";

const DEFAULT_STATUS: u16 = 500;

/// Server startup errors.
#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Schema registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure raised while serving a request.
///
/// Every field is optional so that loosely shaped errors (plain JSON
/// objects, foreign error types) can be carried without loss. Missing
/// pieces are filled in by [`ErrorHandler::render`].
#[derive(Debug, Clone, Default, Error)]
#[error("{}", .message.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE))]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: Option<String>,
    pub details: Option<Vec<FieldErrorDetail>>,
    pub stack: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(501, message)
    }

    /// A server fault raised at this point. The stack records the message
    /// and, when backtraces are enabled, the call site.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: Some(DEFAULT_STATUS),
            stack: Some(describe_message(&message, &Backtrace::capture())),
            message: Some(message),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<FieldErrorDetail>) -> Self {
        self.details = Some(details);
        self
    }

    /// Wrap an arbitrary error as an unclassified failure.
    ///
    /// The stack lists the error and its source chain.
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        Self {
            status: None,
            message: Some(error.to_string()),
            details: None,
            stack: Some(describe_chain(error, None)),
        }
    }

    /// Read an error from a loosely shaped JSON value.
    ///
    /// Objects are duck-typed on `message`, `statusCode`, `details` and
    /// `stack`; fields with an unexpected shape are ignored. A bare string
    /// is taken as the message.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(object) => Self {
                status: object.get("statusCode").and_then(status_from_json),
                message: object
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                details: object
                    .get("details")
                    .and_then(|details| serde_json::from_value(details.clone()).ok()),
                stack: object.get("stack").and_then(Value::as_str).map(str::to_string),
            },
            Value::String(message) => Self {
                message: Some(message.clone()),
                ..Default::default()
            },
            _ => Self::default(),
        }
    }

    /// Status code the response will carry.
    pub fn status_code(&self) -> u16 {
        resolve_status(self.status)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self {
            status: Some(error.status_code),
            message: Some(error.message),
            details: Some(error.details),
            stack: None,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        let source: &(dyn StdError + 'static) = error.as_ref();
        Self {
            status: None,
            message: Some(error.to_string()),
            details: None,
            stack: Some(describe_chain(source, Some(error.backtrace()))),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

fn resolve_status(status: Option<u16>) -> u16 {
    match status {
        Some(code) if (400..=599).contains(&code) => code,
        _ => DEFAULT_STATUS,
    }
}

fn status_from_json(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn describe_chain(error: &(dyn StdError + 'static), backtrace: Option<&Backtrace>) -> String {
    let mut stack = format!("Error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(stack, "\n    caused by: {cause}");
        source = cause.source();
    }
    if let Some(backtrace) = backtrace {
        append_backtrace(&mut stack, backtrace);
    }
    stack
}

fn describe_message(message: &str, backtrace: &Backtrace) -> String {
    let mut stack = format!("Error: {message}");
    append_backtrace(&mut stack, backtrace);
    stack
}

fn append_backtrace(stack: &mut String, backtrace: &Backtrace) {
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(stack, "\n{backtrace}");
    }
}

/// Standard error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub status: u16,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldErrorDetail>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Request being answered, for logging.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
}

impl RequestContext {
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
        }
    }
}

/// Error handler settings, fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandlerConfig {
    pub environment: Environment,
}

/// Renders [`ApiError`]s into envelopes.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    config: ErrorHandlerConfig,
}

impl ErrorHandler {
    pub fn new(config: ErrorHandlerConfig) -> Self {
        Self { config }
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// Build the envelope for `error`.
    ///
    /// Production replaces the message of 500 responses with a fixed one
    /// and never includes a stack.
    pub fn render(&self, error: &ApiError) -> ErrorEnvelope {
        let status = error.status_code();
        let production = self.config.environment.is_production();

        let message = if status == DEFAULT_STATUS && production {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            error
                .message
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string())
        };

        ErrorEnvelope {
            success: false,
            status,
            error: message,
            details: error.details.clone(),
            stack: if production { None } else { error.stack.clone() },
        }
    }

    /// Log `error` and turn it into the final response.
    pub fn handle(&self, error: &ApiError, context: &RequestContext) -> Response {
        let envelope = self.render(error);
        self.log(error, &envelope, context);

        let status =
            StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }

    fn log(&self, error: &ApiError, envelope: &ErrorEnvelope, context: &RequestContext) {
        let message = error.message.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE);
        if envelope.status >= 500 {
            error!(
                status = envelope.status,
                method = %context.method,
                path = %context.path,
                "{message}"
            );
            if !self.config.environment.is_production() {
                if let Some(stack) = &error.stack {
                    error!(status = envelope.status, "{stack}");
                }
            }
        } else {
            warn!(
                status = envelope.status,
                method = %context.method,
                path = %context.path,
                "{message}"
            );
        }
    }
}

/// Outermost middleware: renders placeholder error responses.
pub async fn handle_errors(
    State(handler): State<Arc<ErrorHandler>>,
    request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_request(&request);
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<ApiError>() {
        Some(error) => handler.handle(&error, &context),
        None if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            let error = ApiError::new(
                405,
                format!("Method {} not allowed on {}", context.method, context.path),
            );
            let mut rendered = handler.handle(&error, &context);
            if let Some(allow) = response.headers().get(ALLOW) {
                rendered.headers_mut().insert(ALLOW, allow.clone());
            }
            rendered
        }
        None => response,
    }
}

/// Panic responder for `CatchPanicLayer`.
///
/// The panic becomes an unclassified error whose stack carries the panic
/// message.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Handler panicked".to_string()
    };
    ApiError {
        stack: Some(describe_message(&message, &Backtrace::capture())),
        message: Some(message),
        ..Default::default()
    }
    .into_response()
}

/// Fallback for unmatched routes.
pub async fn route_not_found(request: Request) -> ApiError {
    ApiError::not_found(format!(
        "Route {} {} not found",
        request.method(),
        request.uri().path()
    ))
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
