//! Load model definitions from JSON (an array of model objects).

use crate::error::ModelError;
use crate::model::{ModelDefinition, ModelRegistry};
use std::path::Path;

impl ModelRegistry {
    /// Build a registry from a JSON array of model definitions.
    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        let models: Vec<ModelDefinition> =
            serde_json::from_str(s).map_err(|e| ModelError::Load(e.to_string()))?;
        let mut registry = ModelRegistry::new();
        for model in models {
            registry.register(model)?;
        }
        Ok(registry)
    }
}

/// Read a JSON model file (e.g. from `CRUDAPI_MODELS`) into a registry.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ModelRegistry, ModelError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;
    let registry = ModelRegistry::from_json_str(&raw)?;
    tracing::info!(path = %path.display(), models = registry.models().count(), "models loaded");
    Ok(registry)
}
