//! Browser action handlers.
//!
//! Requests are fully validated and sanitized, but no browser driver is
//! wired in yet, so every action answers 501.

use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::ValidatedRequest;

fn dispatch(action: &'static str, request: ValidatedRequest) -> ApiError {
    let command: Value = request.0.body;
    info!(action, %command, "browser action requested");
    ApiError::not_implemented(format!("Action '{action}' is not implemented yet"))
}

/// POST /api/actions/navigate
pub async fn navigate(request: ValidatedRequest) -> ApiError {
    dispatch("navigate", request)
}

/// POST /api/actions/click
pub async fn click(request: ValidatedRequest) -> ApiError {
    dispatch("click", request)
}

/// POST /api/actions/type
pub async fn type_text(request: ValidatedRequest) -> ApiError {
    dispatch("type", request)
}

/// POST /api/actions/extract
pub async fn extract(request: ValidatedRequest) -> ApiError {
    dispatch("extract", request)
}

/// POST /api/actions/wait
pub async fn wait(request: ValidatedRequest) -> ApiError {
    dispatch("wait", request)
}

/// POST /api/actions/screenshot
pub async fn screenshot(request: ValidatedRequest) -> ApiError {
    dispatch("screenshot", request)
}
