//! Route group: one model bound to its derived schemas, URL prefix and documentation tag.

use crate::case::route_tag;
use crate::error::{AppError, SchemaDerivationError, ValidationError};
use crate::model::{FieldKind, ModelDefinition};
use crate::schema::ModelSchemas;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct RouteGroup {
    pub model: ModelDefinition,
    pub schemas: ModelSchemas,
    /// `/{ModelName}`
    pub prefix: String,
    /// `{Category} - {Model Name Words}`
    pub tag: String,
}

impl RouteGroup {
    pub fn new(model: ModelDefinition) -> Result<Self, SchemaDerivationError> {
        let schemas = ModelSchemas::derive(&model)?;
        Ok(RouteGroup {
            prefix: format!("/{}", model.name),
            tag: route_tag(&model.category, &model.name),
            schemas,
            model,
        })
    }

    /// Mount point: `/{category}/{ModelName}`.
    pub fn path(&self) -> String {
        format!("/{}{}", self.model.category, self.prefix)
    }

    pub fn key_kind(&self) -> FieldKind {
        self.model.pk_field().map(|f| f.kind).unwrap_or(FieldKind::Text)
    }

    /// Parse a path segment as this model's primary key.
    pub fn parse_pk(&self, raw: &str) -> Result<Value, ValidationError> {
        self.key_kind()
            .parse_key(raw)
            .map_err(|(msg, kind)| ValidationError::single(&["path", self.model.primary_key.as_str()], msg, kind))
    }

    pub fn not_found(&self) -> AppError {
        AppError::NotFound(self.model.name.to_lowercase())
    }
}
