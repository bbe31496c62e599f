//! Static model registry: models are listed explicitly at startup and grouped by category.

use crate::error::ModelError;
use crate::model::ModelDefinition;
use crate::schema::ModelSchemas;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    categories: BTreeMap<String, Vec<ModelDefinition>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        ModelRegistry::default()
    }

    /// Validate and register one model.
    pub fn register(&mut self, model: ModelDefinition) -> Result<&mut Self, ModelError> {
        validate(&model)?;
        let table = model.table_name();
        for existing in self.models() {
            if existing.category == model.category && existing.name == model.name {
                return Err(ModelError::Duplicate {
                    kind: "model",
                    name: format!("{}.{}", model.category, model.name),
                });
            }
            if existing.table_name() == table {
                return Err(ModelError::Duplicate { kind: "table", name: table });
            }
        }
        tracing::debug!(category = %model.category, model = %model.name, %table, "model registered");
        self.categories.entry(model.category.clone()).or_default().push(model);
        Ok(self)
    }

    /// Builder-style registration.
    pub fn with(mut self, model: ModelDefinition) -> Result<Self, ModelError> {
        self.register(model)?;
        Ok(self)
    }

    /// Register every model of `other` into this registry.
    pub fn merge(&mut self, other: ModelRegistry) -> Result<&mut Self, ModelError> {
        for model in other.categories.into_values().flatten() {
            self.register(model)?;
        }
        Ok(self)
    }

    /// Category name to its models, categories sorted by name, models in registration order.
    pub fn list_categories(&self) -> &BTreeMap<String, Vec<ModelDefinition>> {
        &self.categories
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.categories.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn validate(model: &ModelDefinition) -> Result<(), ModelError> {
    let table = model.table_name();
    let names = [model.category.as_str(), model.name.as_str(), table.as_str()];
    for name in names.into_iter().chain(model.fields.iter().map(|f| f.name.as_str())) {
        if !IDENTIFIER.is_match(name) {
            return Err(ModelError::InvalidIdentifier(name.to_string()));
        }
    }

    let pk = model.pk_field().ok_or_else(|| ModelError::MissingPrimaryKey {
        model: model.name.clone(),
        field: model.primary_key.clone(),
    })?;
    if !pk.kind.is_key_kind() || pk.nullable {
        return Err(ModelError::UnsupportedPrimaryKey {
            model: model.name.clone(),
            field: pk.name.clone(),
        });
    }

    // The key and managed fields never appear in a create body, so the server must fill them.
    for f in &model.fields {
        let server_filled = f.name == model.primary_key || model.is_managed(&f.name);
        if server_filled && f.default.is_none() && (f.name == model.primary_key || !f.nullable) {
            return Err(ModelError::NoServerValue {
                model: model.name.clone(),
                field: f.name.clone(),
            });
        }
    }

    // Duplicate field names surface here as schema derivation errors.
    ModelSchemas::derive(model)?;
    Ok(())
}
