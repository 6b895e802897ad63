//! Flow variable handlers.
//!
//! - GET    /api/variables         - List variables
//! - GET    /api/variables/{name}  - Get variable
//! - PUT    /api/variables/{name}  - Set variable
//! - DELETE /api/variables/{name}  - Delete variable

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{ApiResponse, ok};
use crate::error::ApiError;
use crate::middleware::ValidatedRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NameParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetVariableBody {
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct VariableResponse {
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
}

fn variable_not_found(name: &str) -> ApiError {
    ApiError::not_found(format!("Variable '{name}' not found"))
}

/// GET /api/variables
pub async fn list_variables(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<BTreeMap<String, Value>>> {
    ok(state.variables.list().await)
}

/// GET /api/variables/{name}
pub async fn get_variable(
    State(state): State<Arc<AppState>>,
    request: ValidatedRequest,
) -> Result<Json<ApiResponse<VariableResponse>>, ApiError> {
    let NameParams { name } = request.params_as()?;
    let value = state
        .variables
        .get(&name)
        .await
        .ok_or_else(|| variable_not_found(&name))?;
    Ok(ok(VariableResponse {
        name,
        value,
        previous: None,
    }))
}

/// PUT /api/variables/{name}
pub async fn set_variable(
    State(state): State<Arc<AppState>>,
    request: ValidatedRequest,
) -> Result<Json<ApiResponse<VariableResponse>>, ApiError> {
    let NameParams { name } = request.params_as()?;
    let SetVariableBody { value } = request.body_as()?;

    let previous = state
        .variables
        .set(name.clone(), value.clone())
        .await
        .map_err(|e| ApiError::new(409, e.to_string()))?;
    info!(variable = %name, replaced = previous.is_some(), "flow variable set");

    Ok(ok(VariableResponse {
        name,
        value,
        previous,
    }))
}

/// DELETE /api/variables/{name}
pub async fn delete_variable(
    State(state): State<Arc<AppState>>,
    request: ValidatedRequest,
) -> Result<StatusCode, ApiError> {
    let NameParams { name } = request.params_as()?;
    match state.variables.remove(&name).await {
        Some(_) => {
            info!(variable = %name, "flow variable deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(variable_not_found(&name)),
    }
}
