//! Convert serde_json::Value to text parameters for PostgreSQL.
//!
//! Every placeholder carries an explicit cast (`$1::uuid`, `$2::jsonb`, ...), so values are
//! bound as nullable text and PostgreSQL performs the conversion.

use crate::model::FieldKind;
use serde_json::Value;

/// Text form of `v` for a `$n::<kind>` placeholder. jsonb takes the serialized JSON, so a
/// JSON string keeps its quotes there.
pub fn bind_text(v: &Value, kind: FieldKind) -> Option<String> {
    match v {
        Value::Null => None,
        _ if kind == FieldKind::Json => Some(v.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}
