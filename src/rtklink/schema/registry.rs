//! Name-keyed schema registry with a bounded table.

use log::{debug, info};

use super::builtin::builtin_definitions;
use super::error::{SchemaError, SchemaResult};
use super::types::SchemaDefinition;

/// Default capacity of the registry table.
pub const DEFAULT_SCHEMA_CAPACITY: usize = 32;

/// Holds named schema definitions for validation.
///
/// The registry is an explicit struct rather than a process-wide table:
/// hosts construct one (usually via [`SchemaRegistry::with_builtins`]) and
/// share it behind `Arc<RwLock<…>>` when mutation and validation run on
/// different threads.
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: Vec<SchemaDefinition>,
    capacity: usize,
}

impl SchemaRegistry {
    /// Create an empty registry with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SCHEMA_CAPACITY)
    }

    /// Create an empty registry holding at most `capacity` definitions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            schemas: Vec::new(),
            capacity,
        }
    }

    /// Create a registry pre-seeded with the canonical built-in schemas.
    pub fn with_builtins() -> SchemaResult<Self> {
        let mut registry = Self::new();
        registry.register_builtin_schemas()?;
        info!(
            "schema registry initialized with {} schemas",
            registry.len()
        );
        Ok(registry)
    }

    /// Seed the registry with the canonical schemas
    /// (`state/1.0`, `evt.wifi.roam_miss/1.0`, `lwt/1.0`,
    /// `cmd.diagnosis.get/1.0`).
    pub fn register_builtin_schemas(&mut self) -> SchemaResult<()> {
        for definition in builtin_definitions() {
            self.register_custom(definition)?;
        }
        Ok(())
    }

    /// Register an application-specific schema definition.
    ///
    /// Fails only when the bounded table is full. Duplicate names are not
    /// rejected: lookup is first-match, so the earliest registration under a
    /// name wins and later ones shadow silently.
    pub fn register_custom(&mut self, definition: SchemaDefinition) -> SchemaResult<()> {
        if definition.name.is_empty() {
            return Err(SchemaError::InvalidParam("schema name is empty".to_string()));
        }
        if definition.schema_text.is_empty() {
            return Err(SchemaError::InvalidParam(format!(
                "schema text for '{}' is empty",
                definition.name
            )));
        }
        if self.schemas.len() >= self.capacity {
            return Err(SchemaError::Capacity {
                limit: self.capacity,
            });
        }

        debug!("registered schema: {}", definition.name);
        self.schemas.push(definition);
        Ok(())
    }

    /// First registered definition under `name`, if any.
    pub fn find_by_name(&self, name: &str) -> Option<&SchemaDefinition> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Every registered definition, in registration order.
    pub fn list_all(&self) -> &[SchemaDefinition] {
        &self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
