//! Built-in data models, grouped by category.

use crudapi::{FieldDef, FieldDefault, FieldKind, ModelDefinition, ModelError, ModelRegistry};
use serde_json::json;

fn user() -> ModelDefinition {
    ModelDefinition::new("users", "User")
        .field(FieldDef::new("name", FieldKind::Text))
        .field(FieldDef::new("email", FieldKind::Text).nullable())
        .managed_timestamps()
}

fn product() -> ModelDefinition {
    ModelDefinition::new("inventory", "Product")
        .field(FieldDef::new("title", FieldKind::Text))
        .field(FieldDef::new("price", FieldKind::Float))
        .field(FieldDef::new("in_stock", FieldKind::Bool).default(FieldDefault::Value(json!(true))))
        .field(FieldDef::new("attributes", FieldKind::Json).nullable())
        .managed_timestamps()
}

fn warehouse_stock() -> ModelDefinition {
    ModelDefinition::new("inventory", "WarehouseStock")
        .field(FieldDef::new("product_uuid", FieldKind::Uuid))
        .field(FieldDef::new("warehouse", FieldKind::Text))
        .field(FieldDef::new("quantity", FieldKind::Int))
        .managed_timestamps()
}

fn audit_entry() -> ModelDefinition {
    ModelDefinition::new("audit", "AuditEntry")
        .with_primary_key(FieldDef::new("id", FieldKind::BigInt).default(FieldDefault::Sequence))
        .field(FieldDef::new("action", FieldKind::Text))
        .field(FieldDef::new("actor", FieldKind::Text).nullable())
        .field(FieldDef::new("payload", FieldKind::Json).nullable())
        .field(FieldDef::new("recorded_at", FieldKind::Timestamp).default(FieldDefault::Now))
}

pub fn registry() -> Result<ModelRegistry, ModelError> {
    ModelRegistry::new()
        .with(user())?
        .with(product())?
        .with(warehouse_stock())?
        .with(audit_entry())
}
