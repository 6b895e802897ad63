//! # BrowserFlow API
//!
//! HTTP layer of the BrowserFlow backend.
//!
//! - **Validation**: each route names an operation in the schema registry;
//!   [`middleware::validated`] attaches the matching validator, which
//!   sanitizes body, path parameters and query before the handler runs.
//! - **Errors**: handlers return [`ApiError`]; the outermost
//!   [`error::handle_errors`] middleware renders every error (validation
//!   failures, unknown routes, panics) as one JSON envelope, hiding internal
//!   details in production.
//! - **Routes**: block catalog and categories, browser actions (validated,
//!   not yet executed), flow variables and health.

pub mod catalog;
pub mod error;
pub mod http;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod state;
pub mod variables;

pub use error::{
    ApiError, ErrorEnvelope, ErrorHandler, ErrorHandlerConfig, INTERNAL_ERROR_MESSAGE,
    InterfaceError, RequestContext, UNKNOWN_ERROR_MESSAGE,
};
pub use http::routes::create_router;
pub use middleware::ValidatedRequest;
pub use schemas::build_registry;
pub use server::{ApiServer, InterfaceConfig};
pub use state::AppState;
pub use variables::{DEFAULT_MAX_VARIABLES, FlowVariableStore, VariableError};
