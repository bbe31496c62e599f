//! Derived schemas: read / create / update projections of a model's fields.
//! Used only for request validation and response shaping.

use crate::error::{FieldError, SchemaDerivationError, ValidationError};
use crate::model::{FieldDef, ModelDefinition};
use crate::session::Record;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Purpose {
    Read,
    Create,
    Update,
}

impl Purpose {
    /// Suffix of the generated schema name. Read schemas carry the bare model name.
    pub fn suffix(&self) -> &'static str {
        match self {
            Purpose::Read => "",
            Purpose::Create => "Create",
            Purpose::Update => "Update",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DerivedSchema {
    /// `{category}{ModelName}{Suffix}`, unique per (category, model, purpose).
    pub name: String,
    pub purpose: Purpose,
    pub fields: Vec<FieldDef>,
}

/// Copy every field of `model` not in `exclude`, keeping declared types.
pub fn derive(
    model: &ModelDefinition,
    exclude: &HashSet<String>,
    purpose: Purpose,
) -> Result<DerivedSchema, SchemaDerivationError> {
    let name = format!("{}{}{}", model.category, model.name, purpose.suffix());
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for f in &model.fields {
        if !seen.insert(f.name.as_str()) {
            return Err(SchemaDerivationError::DuplicateField {
                schema: name,
                field: f.name.clone(),
            });
        }
        if !exclude.contains(&f.name) {
            fields.push(f.clone());
        }
    }
    if fields.is_empty() {
        return Err(SchemaDerivationError::NoFields { schema: name });
    }
    Ok(DerivedSchema { name, purpose, fields })
}

impl DerivedSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Structural validation of a request body. Create requires every non-nullable field;
    /// update accepts any subset. Unknown keys are rejected. Returns the normalized record.
    pub fn validate(&self, body: &Value) -> Result<Record, ValidationError> {
        let Value::Object(obj) = body else {
            return Err(ValidationError::single(&["body"], "value is not a valid dict", "type_error.dict"));
        };
        let mut out = Record::new();
        let mut errors = Vec::new();
        for f in &self.fields {
            match obj.get(&f.name) {
                None if self.purpose == Purpose::Update || f.nullable => {}
                None => errors.push(FieldError::new(&["body", f.name.as_str()], "field required", "value_error.missing")),
                Some(Value::Null) if f.nullable => {
                    out.insert(f.name.clone(), Value::Null);
                }
                Some(Value::Null) => errors.push(FieldError::new(
                    &["body", f.name.as_str()],
                    "none is not an allowed value",
                    "type_error.none.not_allowed",
                )),
                Some(v) => match f.kind.coerce(v) {
                    Ok(v) => {
                        out.insert(f.name.clone(), v);
                    }
                    Err((msg, kind)) => errors.push(FieldError::new(&["body", f.name.as_str()], msg, kind)),
                },
            }
        }
        for key in obj.keys() {
            if self.field(key).is_none() {
                errors.push(FieldError::new(&["body", key.as_str()], "extra fields not permitted", "value_error.extra"));
            }
        }
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError { errors })
        }
    }

    /// Keep only this schema's fields of a stored row, in declaration order.
    pub fn project(&self, row: &Record) -> Record {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), row.get(&f.name).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

/// The three projections of one model.
#[derive(Clone, Debug)]
pub struct ModelSchemas {
    pub read: DerivedSchema,
    pub create: DerivedSchema,
    pub update: DerivedSchema,
}

impl ModelSchemas {
    /// Read excludes managed fields; create and update also exclude the primary key.
    pub fn derive(model: &ModelDefinition) -> Result<Self, SchemaDerivationError> {
        let mut exclude: HashSet<String> = model.managed.iter().cloned().collect();
        let read = derive(model, &exclude, Purpose::Read)?;
        exclude.insert(model.primary_key.clone());
        let create = derive(model, &exclude, Purpose::Create)?;
        let update = derive(model, &exclude, Purpose::Update)?;
        Ok(ModelSchemas { read, create, update })
    }

    pub fn all(&self) -> [&DerivedSchema; 3] {
        [&self.read, &self.create, &self.update]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> ModelDefinition {
        ModelDefinition::new("users", "User")
            .field(FieldDef::new("name", FieldKind::Text))
            .field(FieldDef::new("age", FieldKind::Int).nullable())
            .managed_timestamps()
    }

    fn names(s: &DerivedSchema) -> Vec<&str> {
        s.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn projections_exclude_managed_and_key() {
        let schemas = ModelSchemas::derive(&user()).expect("schemas");
        assert_eq!(names(&schemas.read), vec!["uuid", "name", "age"]);
        assert_eq!(names(&schemas.create), vec!["name", "age"]);
        assert_eq!(names(&schemas.update), vec!["name", "age"]);
        assert_eq!(schemas.read.name, "usersUser");
        assert_eq!(schemas.create.name, "usersUserCreate");
        assert_eq!(schemas.update.name, "usersUserUpdate");
    }

    #[test]
    fn derive_with_custom_exclusions() {
        let exclude: HashSet<String> = ["age".to_string()].into_iter().collect();
        let s = derive(&user(), &exclude, Purpose::Read).expect("schema");
        assert_eq!(names(&s), vec!["uuid", "name", "created_at", "updated_at"]);
    }

    #[test]
    fn create_requires_non_nullable_fields() {
        let schemas = ModelSchemas::derive(&user()).expect("schemas");
        let err = schemas.create.validate(&json!({ "age": 36 })).unwrap_err();
        assert_eq!(
            err.errors,
            vec![FieldError::new(&["body", "name"], "field required", "value_error.missing")]
        );
        let ok = schemas.create.validate(&json!({ "name": "Ada" })).expect("valid");
        assert_eq!(Value::Object(ok), json!({ "name": "Ada" }));
        let ok = schemas.create.validate(&json!({ "name": "Ada", "age": null })).expect("valid");
        assert_eq!(Value::Object(ok), json!({ "name": "Ada", "age": null }));
    }

    #[test]
    fn update_accepts_partial_bodies() {
        let schemas = ModelSchemas::derive(&user()).expect("schemas");
        let ok = schemas.update.validate(&json!({ "age": 36 })).expect("valid");
        assert_eq!(Value::Object(ok), json!({ "age": 36 }));
        assert!(schemas.update.validate(&json!({})).is_ok());
    }

    #[test]
    fn rejects_wrong_types_nulls_and_extra_keys() {
        let schemas = ModelSchemas::derive(&user()).expect("schemas");
        let err = schemas
            .create
            .validate(&json!({ "name": null, "age": "old", "uuid": "x", "created_at": "now" }))
            .unwrap_err();
        let kinds: Vec<(&str, &str)> = err
            .errors
            .iter()
            .map(|e| (e.loc[1].as_str(), e.kind.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("name", "type_error.none.not_allowed"),
                ("age", "type_error.integer"),
                ("created_at", "value_error.extra"),
                ("uuid", "value_error.extra"),
            ]
        );
    }

    #[test]
    fn body_must_be_an_object() {
        let schemas = ModelSchemas::derive(&user()).expect("schemas");
        let err = schemas.update.validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.errors[0].loc, vec!["body"]);
        assert_eq!(err.errors[0].kind, "type_error.dict");
    }

    #[test]
    fn project_keeps_schema_fields_only() {
        let schemas = ModelSchemas::derive(&user()).expect("schemas");
        let row: Record = json!({
            "uuid": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "name": "Ada",
            "created_at": "2024-01-01T00:00:00+00:00"
        })
        .as_object()
        .cloned()
        .unwrap_or_default();
        assert_eq!(
            Value::Object(schemas.read.project(&row)),
            json!({ "uuid": "6f9619ff-8b86-d011-b42d-00c04fc964ff", "name": "Ada", "age": null })
        );
    }
}
