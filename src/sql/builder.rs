//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and DDL from a model definition.

use crate::model::{FieldDefault, FieldDef, FieldKind, ModelDefinition};
use crate::pagination::PaginationRequest;
use crate::session::Record;
use crate::sql::bind_text;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: registry only admits plain identifiers).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
    /// Kind behind each placeholder, parallel to `params`.
    pub kinds: Vec<FieldKind>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
            kinds: Vec::new(),
        }
    }

    /// Push a value and return its cast placeholder, e.g. `$2::uuid`.
    fn push_param(&mut self, v: Value, kind: FieldKind) -> String {
        self.params.push(v);
        self.kinds.push(kind);
        format!("${}::{}", self.params.len(), kind.pg_type())
    }

    /// Parameters in bind order, as the text each cast placeholder expects.
    pub fn bound(&self) -> Vec<Option<String>> {
        self.params
            .iter()
            .zip(&self.kinds)
            .map(|(v, kind)| bind_text(v, *kind))
            .collect()
    }
}

fn select_column_list(model: &ModelDefinition) -> String {
    model
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn pk_kind(model: &ModelDefinition) -> FieldKind {
    model.pk_field().map(|f| f.kind).unwrap_or(FieldKind::Text)
}

/// SELECT page ordered by primary key.
pub fn select_page(model: &ModelDefinition, page: &PaginationRequest) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit_clause = page.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {} ASC{} OFFSET {}",
        select_column_list(model),
        quoted(&model.table_name()),
        quoted(&model.primary_key),
        limit_clause,
        page.skip
    );
    q
}

/// SELECT one row by primary key.
pub fn select_by_pk(model: &ModelDefinition, pk: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(pk.clone(), pk_kind(model));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(model),
        quoted(&model.table_name()),
        quoted(&model.primary_key),
        ph
    );
    q
}

/// INSERT the provided columns; absent columns with a default are left to the database.
pub fn insert(model: &ModelDefinition, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &model.fields {
        let val = match values.get(&f.name) {
            Some(v) => v.clone(),
            None if f.default.is_some() => continue,
            None => Value::Null,
        };
        placeholders.push(q.push_param(val, f.kind));
        cols.push(quoted(&f.name));
    }
    let table = quoted(&model.table_name());
    let returning = select_column_list(model);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by primary key: SET the provided columns (never the key) plus refresh-on-update
/// columns. With nothing to set, degrades to a SELECT of the row.
pub fn update(model: &ModelDefinition, pk: &Value, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in &model.fields {
        if f.name == model.primary_key {
            continue;
        }
        if f.refresh_on_update {
            sets.push(format!("{} = NOW()", quoted(&f.name)));
            continue;
        }
        if let Some(v) = values.get(&f.name) {
            let ph = q.push_param(v.clone(), f.kind);
            sets.push(format!("{} = {}", quoted(&f.name), ph));
        }
    }
    if sets.is_empty() {
        return select_by_pk(model, pk);
    }
    let id_ph = q.push_param(pk.clone(), pk_kind(model));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(&model.table_name()),
        sets.join(", "),
        quoted(&model.primary_key),
        id_ph,
        select_column_list(model)
    );
    q
}

/// DELETE by primary key, returning the removed row.
pub fn delete(model: &ModelDefinition, pk: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(pk.clone(), pk_kind(model));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(&model.table_name()),
        quoted(&model.primary_key),
        ph,
        select_column_list(model)
    );
    q
}

pub fn delete_all(model: &ModelDefinition) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {}", quoted(&model.table_name()));
    q
}

fn column_type(f: &FieldDef) -> &'static str {
    match (&f.default, f.kind) {
        (Some(FieldDefault::Sequence), FieldKind::Int) => "serial",
        (Some(FieldDefault::Sequence), _) => "bigserial",
        (_, kind) => kind.pg_type(),
    }
}

fn literal(v: &Value, kind: FieldKind) -> String {
    match v {
        Value::Null => "NULL".into(),
        _ if kind == FieldKind::Json => format!("'{}'::jsonb", v.to_string().replace('\'', "''")),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// CREATE TABLE IF NOT EXISTS for one model.
pub fn create_table(model: &ModelDefinition) -> String {
    let mut col_defs: Vec<String> = Vec::new();
    for f in &model.fields {
        let mut def = format!("{} {}", quoted(&f.name), column_type(f));
        if !f.nullable {
            def.push_str(" NOT NULL");
        }
        match &f.default {
            Some(FieldDefault::GeneratedUuid) => def.push_str(" DEFAULT gen_random_uuid()"),
            Some(FieldDefault::Now) => def.push_str(" DEFAULT NOW()"),
            Some(FieldDefault::Value(v)) => {
                def.push_str(" DEFAULT ");
                def.push_str(&literal(v, f.kind));
            }
            Some(FieldDefault::Sequence) | None => {}
        }
        col_defs.push(def);
    }
    col_defs.push(format!("PRIMARY KEY ({})", quoted(&model.primary_key)));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(&model.table_name()),
        col_defs.join(",\n  ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> ModelDefinition {
        ModelDefinition::new("users", "User")
            .field(FieldDef::new("name", FieldKind::Text))
            .field(FieldDef::new("active", FieldKind::Bool).default(FieldDefault::Value(json!(true))))
            .managed_timestamps()
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap_or_default()
    }

    const COLS: &str = r#""uuid", "name", "active", "created_at", "updated_at""#;

    #[test]
    fn page_query_orders_by_key() {
        let q = select_page(&user(), &PaginationRequest { skip: 5, limit: Some(10) });
        assert_eq!(
            q.sql,
            format!(r#"SELECT {} FROM "user" ORDER BY "uuid" ASC LIMIT 10 OFFSET 5"#, COLS)
        );
        let q = select_page(&user(), &PaginationRequest::unbounded());
        assert_eq!(q.sql, format!(r#"SELECT {} FROM "user" ORDER BY "uuid" ASC OFFSET 0"#, COLS));
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_leaves_defaults_to_the_database() {
        let q = insert(&user(), &record(json!({ "name": "Ada" })));
        assert_eq!(
            q.sql,
            format!(r#"INSERT INTO "user" ("name") VALUES ($1::text) RETURNING {}"#, COLS)
        );
        assert_eq!(q.params, vec![json!("Ada")]);
    }

    #[test]
    fn update_sets_fields_and_refreshes_timestamp() {
        let pk = json!("6f9619ff-8b86-d011-b42d-00c04fc964ff");
        let q = update(&user(), &pk, &record(json!({ "name": "Lovelace", "uuid": "ignored" })));
        assert_eq!(
            q.sql,
            format!(
                r#"UPDATE "user" SET "name" = $1::text, "updated_at" = NOW() WHERE "uuid" = $2::uuid RETURNING {}"#,
                COLS
            )
        );
        assert_eq!(q.params, vec![json!("Lovelace"), pk]);
    }

    #[test]
    fn json_parameters_bind_as_serialized_json() {
        let doc = ModelDefinition::new("docs", "Doc")
            .field(FieldDef::new("title", FieldKind::Text))
            .field(FieldDef::new("payload", FieldKind::Json).nullable());
        let q = insert(&doc, &record(json!({ "title": "b", "payload": "hello" })));
        assert!(q.sql.contains(r#"("title", "payload") VALUES ($1::text, $2::jsonb)"#), "{}", q.sql);
        assert_eq!(q.bound(), vec![Some("b".to_string()), Some(r#""hello""#.to_string())]);
    }

    #[test]
    fn update_without_sets_selects() {
        let m = ModelDefinition::new("users", "Tag").field(FieldDef::new("label", FieldKind::Text));
        let q = update(&m, &json!("k"), &Record::new());
        assert!(q.sql.starts_with("SELECT"));
        assert_eq!(q.params, vec![json!("k")]);
    }

    #[test]
    fn delete_by_key() {
        let q = delete(&user(), &json!("abc"));
        assert_eq!(
            q.sql,
            format!(r#"DELETE FROM "user" WHERE "uuid" = $1::uuid RETURNING {}"#, COLS)
        );
        assert_eq!(delete_all(&user()).sql, r#"DELETE FROM "user""#);
    }

    #[test]
    fn ddl() {
        let ddl = create_table(&user());
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS \"user\" (\n  \
             \"uuid\" uuid NOT NULL DEFAULT gen_random_uuid(),\n  \
             \"name\" text NOT NULL,\n  \
             \"active\" boolean NOT NULL DEFAULT true,\n  \
             \"created_at\" timestamptz NOT NULL DEFAULT NOW(),\n  \
             \"updated_at\" timestamptz NOT NULL DEFAULT NOW(),\n  \
             PRIMARY KEY (\"uuid\")\n)"
        );
        let audit = ModelDefinition::new("audit", "Entry")
            .with_primary_key(FieldDef::new("id", FieldKind::BigInt).default(FieldDefault::Sequence))
            .field(FieldDef::new("note", FieldKind::Text).nullable());
        assert!(create_table(&audit).contains("\"id\" bigserial NOT NULL,"));
        assert!(create_table(&audit).contains("\"note\" text,"));
    }
}
