//! Application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use browserflow_config::Environment;
use browserflow_validation::{RegistryError, StaticSchemaRegistry};

use crate::catalog::Catalog;
use crate::error::{ErrorHandler, ErrorHandlerConfig};
use crate::schemas::build_registry;
use crate::variables::{DEFAULT_MAX_VARIABLES, FlowVariableStore};

/// Application state shared across handlers.
///
/// Everything except the variable store is immutable after startup.
pub struct AppState {
    pub registry: Arc<StaticSchemaRegistry>,
    pub error_handler: Arc<ErrorHandler>,
    pub variables: Arc<FlowVariableStore>,
    pub catalog: Arc<Catalog>,
    start_time: Instant,
}

impl AppState {
    pub fn new(environment: Environment) -> Result<Self, RegistryError> {
        Self::with_variable_limit(environment, DEFAULT_MAX_VARIABLES)
    }

    /// State whose flow variable store holds at most `max_variables` names.
    pub fn with_variable_limit(
        environment: Environment,
        max_variables: usize,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            registry: Arc::new(build_registry()?),
            error_handler: Arc::new(ErrorHandler::new(ErrorHandlerConfig { environment })),
            variables: Arc::new(FlowVariableStore::with_max_entries(max_variables)),
            catalog: Arc::new(Catalog::builtin()),
            start_time: Instant::now(),
        })
    }

    pub fn environment(&self) -> Environment {
        self.error_handler.environment()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
