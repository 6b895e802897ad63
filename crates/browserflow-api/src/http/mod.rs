//! HTTP handlers and routing.

pub mod actions;
pub mod catalog;
pub mod monitoring;
pub mod routes;
pub mod variables;

use axum::Json;
use serde::Serialize;

/// Success response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}
