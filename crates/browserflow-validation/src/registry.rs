//! Named schema lookup.

use std::collections::BTreeMap;

use crate::composite::ValidationConfig;
use crate::error::RegistryError;
use crate::validator::Validator;

/// Source of per-operation schemas.
pub trait SchemaRegistry: Send + Sync {
    /// Schemas configured for `operation`.
    fn lookup(&self, operation: &str) -> Result<&ValidationConfig, RegistryError>;

    /// Registered operation names, sorted.
    fn operations(&self) -> Vec<&str>;

    /// Build a validator for `operation`.
    fn validator(&self, operation: &str) -> Result<Validator, RegistryError> {
        let config = self.lookup(operation)?;
        Validator::new(config.clone()).map_err(|source| RegistryError::InvalidSchema {
            operation: operation.to_string(),
            source,
        })
    }
}

/// Registry filled once at startup and read-only afterwards.
///
/// Schemas are checked on registration, so a registry that was built
/// successfully only hands out usable configurations.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaRegistry {
    operations: BTreeMap<String, ValidationConfig>,
}

impl StaticSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        operation: impl Into<String>,
        config: ValidationConfig,
    ) -> Result<(), RegistryError> {
        let operation = operation.into();
        if self.operations.contains_key(&operation) {
            return Err(RegistryError::Duplicate(operation));
        }
        if let Err(source) = Validator::new(config.clone()) {
            return Err(RegistryError::InvalidSchema { operation, source });
        }
        self.operations.insert(operation, config);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl SchemaRegistry for StaticSchemaRegistry {
    fn lookup(&self, operation: &str) -> Result<&ValidationConfig, RegistryError> {
        self.operations
            .get(operation)
            .ok_or_else(|| RegistryError::NotFound(operation.to_string()))
    }

    fn operations(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }
}
