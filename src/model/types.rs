//! Data model definitions: fields, kinds, server-side defaults.

use crate::case::to_snake_case;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage type of a field. Decides request validation, SQL casts and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Uuid,
    Text,
    Int,
    BigInt,
    Float,
    Bool,
    Timestamp,
    Json,
}

impl FieldKind {
    /// PostgreSQL type name, used for DDL and parameter casts.
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldKind::Uuid => "uuid",
            FieldKind::Text => "text",
            FieldKind::Int => "integer",
            FieldKind::BigInt => "bigint",
            FieldKind::Float => "double precision",
            FieldKind::Bool => "boolean",
            FieldKind::Timestamp => "timestamptz",
            FieldKind::Json => "jsonb",
        }
    }

    /// Kinds that may back a primary key (parsed from a path segment).
    pub fn is_key_kind(&self) -> bool {
        matches!(self, FieldKind::Uuid | FieldKind::Text | FieldKind::Int | FieldKind::BigInt)
    }

    /// Check a JSON value against this kind and return its normalized form.
    /// Err carries (message, error type).
    pub fn coerce(&self, v: &Value) -> Result<Value, (&'static str, &'static str)> {
        match self {
            FieldKind::Uuid => v
                .as_str()
                .and_then(|s| uuid::Uuid::parse_str(s).ok())
                .map(|u| Value::String(u.to_string()))
                .ok_or(("value is not a valid uuid", "type_error.uuid")),
            FieldKind::Text => v
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or(("str type expected", "type_error.str")),
            FieldKind::Int => v
                .as_i64()
                .filter(|n| i32::try_from(*n).is_ok())
                .map(|n| Value::Number(n.into()))
                .ok_or(("value is not a valid integer", "type_error.integer")),
            FieldKind::BigInt => v
                .as_i64()
                .map(|n| Value::Number(n.into()))
                .ok_or(("value is not a valid integer", "type_error.integer")),
            FieldKind::Float => v
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or(("value is not a valid float", "type_error.float")),
            FieldKind::Bool => v
                .as_bool()
                .map(Value::Bool)
                .ok_or(("value could not be parsed to a boolean", "type_error.bool")),
            FieldKind::Timestamp => v
                .as_str()
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|d| Value::String(d.with_timezone(&chrono::Utc).to_rfc3339()))
                .ok_or(("invalid datetime format", "type_error.datetime")),
            FieldKind::Json => Ok(v.clone()),
        }
    }

    /// Parse a raw path segment as a key of this kind.
    pub fn parse_key(&self, raw: &str) -> Result<Value, (&'static str, &'static str)> {
        match self {
            FieldKind::Int | FieldKind::BigInt => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| ("value is not a valid integer", "type_error.integer"))?;
                self.coerce(&Value::Number(n.into()))
            }
            _ => self.coerce(&Value::String(raw.to_string())),
        }
    }
}

/// Value assigned by the server when the client does not (or cannot) provide one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    GeneratedUuid,
    Now,
    /// Auto-incrementing integer.
    Sequence,
    Value(Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<FieldDefault>,
    /// Set to the current time on every update (e.g. updated_at).
    #[serde(default)]
    pub refresh_on_update: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
            refresh_on_update: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn refresh_on_update(mut self) -> Self {
        self.refresh_on_update = true;
        self
    }
}

fn default_primary_key() -> String {
    "uuid".into()
}

fn default_managed() -> Vec<String> {
    vec!["created_at".into(), "updated_at".into()]
}

/// A persisted entity type: a named, typed record schema with a designated primary key and
/// a set of server-managed fields. Immutable once registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Grouping used for the URL prefix and documentation tags.
    pub category: String,
    pub name: String,
    /// Table name; snake_case of `name` when absent.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    pub fields: Vec<FieldDef>,
    #[serde(default = "default_managed")]
    pub managed: Vec<String>,
}

impl ModelDefinition {
    /// New definition with the default primary key: a generated uuid named `uuid`.
    /// `created_at` and `updated_at` count as managed, the same as a JSON definition that
    /// leaves `managed` out.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        ModelDefinition {
            category: category.into(),
            name: name.into(),
            table: None,
            primary_key: default_primary_key(),
            fields: vec![FieldDef::new("uuid", FieldKind::Uuid).default(FieldDefault::GeneratedUuid)],
            managed: default_managed(),
        }
    }

    /// Replace the primary key field.
    pub fn with_primary_key(mut self, field: FieldDef) -> Self {
        let old = std::mem::replace(&mut self.primary_key, field.name.clone());
        self.fields.retain(|f| f.name != old);
        self.fields.insert(0, field);
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds server-managed created_at / updated_at timestamps.
    pub fn managed_timestamps(mut self) -> Self {
        self.fields
            .push(FieldDef::new("created_at", FieldKind::Timestamp).default(FieldDefault::Now));
        self.fields.push(
            FieldDef::new("updated_at", FieldKind::Timestamp)
                .default(FieldDefault::Now)
                .refresh_on_update(),
        );
        for name in ["created_at", "updated_at"] {
            if !self.managed.iter().any(|m| m == name) {
                self.managed.push(name.to_string());
            }
        }
        self
    }

    pub fn table_name(&self) -> String {
        self.table.clone().unwrap_or_else(|| to_snake_case(&self.name))
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field. Registered models always have one.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.field_def(&self.primary_key)
    }

    pub fn is_managed(&self, name: &str) -> bool {
        self.managed.iter().any(|m| m == name)
    }
}
