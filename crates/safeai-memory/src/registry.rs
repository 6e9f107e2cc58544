//! `MemoryRegistry` — one [`MemoryController`] per declared schema.
//!
//! The original `MemoryController.from_documents` silently kept only the
//! first schema found across a document set; this registry is this
//! workspace's resolution of that Open Question (see `DESIGN.md`): every
//! declared schema gets its own controller instead of later ones being
//! dropped on the floor.

use std::collections::HashMap;

use safeai_core::{Result, SafeAiError};

use crate::controller::MemoryController;
use crate::model::{MemorySchema, MemorySchemaDocument};

/// Keeps one [`MemoryController`] per declared schema name.
#[derive(Default)]
pub struct MemoryRegistry {
    controllers: HashMap<String, MemoryController>,
}

impl MemoryRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from already-parsed schemas, rejecting duplicate
    /// schema names.
    pub fn from_schemas(schemas: Vec<MemorySchema>) -> Result<Self> {
        let mut controllers = HashMap::with_capacity(schemas.len());
        for schema in schemas {
            if controllers.contains_key(&schema.name) {
                return Err(SafeAiError::Validation(format!(
                    "duplicate memory schema '{}'",
                    schema.name
                )));
            }
            controllers.insert(schema.name.clone(), MemoryController::new(schema));
        }
        Ok(Self { controllers })
    }

    /// Loads a YAML or JSON schema document from disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let doc: MemorySchemaDocument = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&text).map_err(|e| SafeAiError::Config(e.to_string()))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| SafeAiError::Config(e.to_string()))?
        };
        Self::from_schemas(doc.schemas)
    }

    /// Looks up the controller for a declared schema.
    #[must_use]
    pub fn controller(&self, schema_name: &str) -> Option<&MemoryController> {
        self.controllers.get(schema_name)
    }
}
