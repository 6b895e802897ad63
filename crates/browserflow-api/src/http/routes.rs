//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use browserflow_validation::{RegistryError, SchemaRegistry};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::error::{handle_errors, panic_response, route_not_found};
use crate::http::{actions, catalog, monitoring, variables};
use crate::middleware::validated;
use crate::schemas;
use crate::state::AppState;

/// Create the main router.
///
/// ## Route Structure
///
/// ```text
/// GET    /health                   - Liveness, version, environment
///
/// /api/catalog
///   GET    /api/catalog            - List blocks (category, search, page, limit)
///   GET    /api/catalog/{id}       - Get block
///
/// /api/categories
///   GET    /api/categories         - List categories
///   GET    /api/categories/{id}    - Get category and its blocks
///
/// /api/actions                     - Validated, 501 until a driver is wired in
///   POST   /api/actions/navigate
///   POST   /api/actions/click
///   POST   /api/actions/type
///   POST   /api/actions/extract
///   POST   /api/actions/wait
///   POST   /api/actions/screenshot
///
/// /api/variables
///   GET    /api/variables          - List flow variables
///   GET    /api/variables/{name}   - Get variable
///   PUT    /api/variables/{name}   - Set variable ({ "value": ... })
///   DELETE /api/variables/{name}   - Delete variable
/// ```
///
/// Unmatched routes answer with a 404 envelope. Every error, including
/// handler panics, is rendered by the error handler.
pub fn create_router(state: Arc<AppState>) -> Result<Router, RegistryError> {
    let registry: &dyn SchemaRegistry = state.registry.as_ref();

    let catalog_routes = Router::new()
        .route(
            "/",
            validated(get(catalog::list_blocks), registry, schemas::CATALOG_LIST)?,
        )
        .route(
            "/{id}",
            validated(get(catalog::get_block), registry, schemas::CATALOG_GET)?,
        )
        .with_state(state.clone());

    let category_routes = Router::new()
        .route("/", get(catalog::list_categories))
        .route(
            "/{id}",
            validated(get(catalog::get_category), registry, schemas::CATEGORIES_GET)?,
        )
        .with_state(state.clone());

    let action_routes = Router::new()
        .route(
            "/navigate",
            validated(post(actions::navigate), registry, schemas::ACTIONS_NAVIGATE)?,
        )
        .route(
            "/click",
            validated(post(actions::click), registry, schemas::ACTIONS_CLICK)?,
        )
        .route(
            "/type",
            validated(post(actions::type_text), registry, schemas::ACTIONS_TYPE)?,
        )
        .route(
            "/extract",
            validated(post(actions::extract), registry, schemas::ACTIONS_EXTRACT)?,
        )
        .route(
            "/wait",
            validated(post(actions::wait), registry, schemas::ACTIONS_WAIT)?,
        )
        .route(
            "/screenshot",
            validated(post(actions::screenshot), registry, schemas::ACTIONS_SCREENSHOT)?,
        );

    let variable_routes = Router::new()
        .route("/", get(variables::list_variables))
        .route(
            "/{name}",
            validated(get(variables::get_variable), registry, schemas::VARIABLES_GET)?
                .merge(validated(
                    put(variables::set_variable),
                    registry,
                    schemas::VARIABLES_SET,
                )?)
                .merge(validated(
                    delete(variables::delete_variable),
                    registry,
                    schemas::VARIABLES_GET,
                )?),
        )
        .with_state(state.clone());

    let monitoring_routes = Router::new()
        .route("/health", get(monitoring::health_check))
        .with_state(state.clone());

    let router = Router::new()
        .nest("/api/catalog", catalog_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/actions", action_routes)
        .nest("/api/variables", variable_routes)
        .merge(monitoring_routes)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            state.error_handler.clone(),
            handle_errors,
        ));

    Ok(router)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
