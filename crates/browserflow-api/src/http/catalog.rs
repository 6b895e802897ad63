//! Catalog and category handlers.
//!
//! - GET /api/catalog            - List blocks (filter + pagination)
//! - GET /api/catalog/{id}       - Get block
//! - GET /api/categories         - List categories
//! - GET /api/categories/{id}    - Get category with its blocks

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::{ApiResponse, ok};
use crate::catalog::{Block, BlockFilter, BlockPage, Category};
use crate::error::ApiError;
use crate::middleware::ValidatedRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct IdParams {
    pub id: String,
}

/// Category with the blocks it groups.
#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub blocks: Vec<Block>,
}

/// GET /api/catalog
pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    request: ValidatedRequest,
) -> Result<Json<ApiResponse<BlockPage>>, ApiError> {
    let query: CatalogQuery = request.query_as()?;
    let filter = BlockFilter {
        category: query.category.as_deref(),
        search: query.search.as_deref(),
    };
    let page = state.catalog.search(&filter, query.page, query.limit);
    Ok(ok(page))
}

/// GET /api/catalog/{id}
pub async fn get_block(
    State(state): State<Arc<AppState>>,
    request: ValidatedRequest,
) -> Result<Json<ApiResponse<Block>>, ApiError> {
    let IdParams { id } = request.params_as()?;
    state
        .catalog
        .block(&id)
        .cloned()
        .map(ok)
        .ok_or_else(|| ApiError::not_found(format!("Block '{id}' not found")))
}

/// GET /api/categories
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<Category>>> {
    ok(state.catalog.categories().to_vec())
}

/// GET /api/categories/{id}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    request: ValidatedRequest,
) -> Result<Json<ApiResponse<CategoryDetail>>, ApiError> {
    let IdParams { id } = request.params_as()?;
    let category = state
        .catalog
        .category(&id)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("Category '{id}' not found")))?;
    Ok(ok(CategoryDetail {
        category,
        blocks: state.catalog.blocks_in(&id).into_iter().cloned().collect(),
    }))
}
