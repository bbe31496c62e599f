//! In-process store with the same unit-of-work semantics as the PostgreSQL sessions.
//! Each session reads a private copy of the tables it touches; its changes are replayed
//! onto the shared store on commit (last writer wins) and discarded on drop.

use super::{Record, Session, SessionProvider};
use crate::error::AppError;
use crate::model::{FieldDefault, FieldKind, ModelDefinition};
use crate::pagination::PaginationRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Primary key as stored; integer keys sort numerically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PkKey {
    Int(i64),
    Text(String),
}

impl PkKey {
    fn from_value(v: &Value) -> Result<Self, AppError> {
        match v {
            Value::Number(n) => n
                .as_i64()
                .map(PkKey::Int)
                .ok_or_else(|| AppError::Persistence(format!("unsupported key value {}", v))),
            Value::String(s) => Ok(PkKey::Text(s.clone())),
            other => Err(AppError::Persistence(format!("unsupported key value {}", other))),
        }
    }
}

type Table = BTreeMap<PkKey, Record>;

#[derive(Default)]
struct Store {
    tables: HashMap<String, Table>,
    sequences: HashMap<String, i64>,
}

#[derive(Debug)]
enum Change {
    Put { table: String, key: PkKey, row: Record },
    Remove { table: String, key: PkKey },
    Clear { table: String },
}

#[derive(Clone, Default)]
pub struct MemorySessionProvider {
    store: Arc<Mutex<Store>>,
}

impl MemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed row count of a table.
    pub fn row_count(&self, table: &str) -> Result<usize, AppError> {
        let store = lock(&self.store)?;
        Ok(store.tables.get(table).map(|t| t.len()).unwrap_or(0))
    }
}

fn lock(store: &Mutex<Store>) -> Result<MutexGuard<'_, Store>, AppError> {
    store
        .lock()
        .map_err(|_| AppError::Persistence("memory store lock poisoned".into()))
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn acquire(&self) -> Result<Box<dyn Session>, AppError> {
        Ok(Box::new(MemorySession {
            store: Arc::clone(&self.store),
            working: HashMap::new(),
            changes: Vec::new(),
        }))
    }
}

pub struct MemorySession {
    store: Arc<Mutex<Store>>,
    working: HashMap<String, Table>,
    changes: Vec<Change>,
}

impl MemorySession {
    /// This session's view of a table, copied from the shared store on first use.
    fn table(&mut self, name: &str) -> Result<&mut Table, AppError> {
        if !self.working.contains_key(name) {
            let snapshot = lock(&self.store)?.tables.get(name).cloned().unwrap_or_default();
            self.working.insert(name.to_string(), snapshot);
        }
        self.working
            .get_mut(name)
            .ok_or_else(|| AppError::Persistence(format!("table {} unavailable", name)))
    }

    fn next_sequence(&self, table: &str) -> Result<i64, AppError> {
        let mut store = lock(&self.store)?;
        let n = store.sequences.entry(table.to_string()).or_insert(0);
        *n += 1;
        Ok(*n)
    }
}

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

fn default_value(session: &MemorySession, table: &str, kind: FieldKind, default: &FieldDefault) -> Result<Value, AppError> {
    Ok(match default {
        FieldDefault::GeneratedUuid => Value::String(uuid::Uuid::new_v4().to_string()),
        FieldDefault::Now => now(),
        FieldDefault::Sequence => Value::Number(session.next_sequence(table)?.into()),
        FieldDefault::Value(v) => kind.coerce(v).unwrap_or_else(|_| v.clone()),
    })
}

#[async_trait]
impl Session for MemorySession {
    async fn select_page(&mut self, model: &ModelDefinition, page: &PaginationRequest) -> Result<Vec<Record>, AppError> {
        let table = self.table(&model.table_name())?;
        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let rows = table.values().skip(skip).cloned();
        Ok(match page.limit {
            Some(n) => rows.take(usize::try_from(n).unwrap_or(usize::MAX)).collect(),
            None => rows.collect(),
        })
    }

    async fn select_one(&mut self, model: &ModelDefinition, pk: &Value) -> Result<Option<Record>, AppError> {
        let key = PkKey::from_value(pk)?;
        Ok(self.table(&model.table_name())?.get(&key).cloned())
    }

    async fn insert(&mut self, model: &ModelDefinition, values: &Record) -> Result<Record, AppError> {
        let name = model.table_name();
        let mut row = Record::new();
        for f in &model.fields {
            let v = match (values.get(&f.name), &f.default) {
                (Some(v), _) => v.clone(),
                (None, Some(d)) => default_value(self, &name, f.kind, d)?,
                (None, None) => Value::Null,
            };
            if v.is_null() && !f.nullable {
                return Err(AppError::Persistence(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    f.name, name
                )));
            }
            row.insert(f.name.clone(), v);
        }
        let key = PkKey::from_value(row.get(&model.primary_key).unwrap_or(&Value::Null))?;
        let table = self.table(&name)?;
        if table.contains_key(&key) {
            return Err(AppError::Persistence(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                name
            )));
        }
        table.insert(key.clone(), row.clone());
        self.changes.push(Change::Put { table: name, key, row: row.clone() });
        Ok(row)
    }

    async fn update(&mut self, model: &ModelDefinition, pk: &Value, values: &Record) -> Result<Option<Record>, AppError> {
        let name = model.table_name();
        let key = PkKey::from_value(pk)?;
        let table = self.table(&name)?;
        let Some(row) = table.get_mut(&key) else {
            return Ok(None);
        };
        for f in &model.fields {
            if f.name == model.primary_key {
                continue;
            }
            if f.refresh_on_update {
                row.insert(f.name.clone(), now());
            } else if let Some(v) = values.get(&f.name) {
                row.insert(f.name.clone(), v.clone());
            }
        }
        let row = row.clone();
        self.changes.push(Change::Put { table: name, key, row: row.clone() });
        Ok(Some(row))
    }

    async fn delete(&mut self, model: &ModelDefinition, pk: &Value) -> Result<Option<Record>, AppError> {
        let name = model.table_name();
        let key = PkKey::from_value(pk)?;
        let removed = self.table(&name)?.remove(&key);
        if removed.is_some() {
            self.changes.push(Change::Remove { table: name, key });
        }
        Ok(removed)
    }

    async fn delete_all(&mut self, model: &ModelDefinition) -> Result<u64, AppError> {
        let name = model.table_name();
        let table = self.table(&name)?;
        let n = table.len() as u64;
        table.clear();
        self.changes.push(Change::Clear { table: name });
        Ok(n)
    }

    async fn ping(&mut self) -> Result<(), AppError> {
        lock(&self.store).map(|_| ())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemorySession { store: shared, changes, .. } = *self;
        let mut store = lock(&shared)?;
        for change in changes {
            match change {
                Change::Put { table, key, row } => {
                    store.tables.entry(table).or_default().insert(key, row);
                }
                Change::Remove { table, key } => {
                    if let Some(t) = store.tables.get_mut(&table) {
                        t.remove(&key);
                    }
                }
                Change::Clear { table } => {
                    store.tables.remove(&table);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;
    use serde_json::json;

    fn user() -> ModelDefinition {
        ModelDefinition::new("users", "User")
            .field(FieldDef::new("name", FieldKind::Text))
            .field(FieldDef::new("email", FieldKind::Text).nullable())
            .managed_timestamps()
    }

    fn entry() -> ModelDefinition {
        ModelDefinition::new("audit", "Entry")
            .with_primary_key(FieldDef::new("id", FieldKind::BigInt).default(FieldDefault::Sequence))
            .field(FieldDef::new("note", FieldKind::Text))
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn insert_applies_defaults() {
        let provider = MemorySessionProvider::new();
        let mut s = provider.acquire().await.unwrap();
        let row = s.insert(&user(), &record(json!({ "name": "Ada" }))).await.unwrap();
        assert!(uuid::Uuid::parse_str(row["uuid"].as_str().unwrap()).is_ok());
        assert_eq!(row["email"], Value::Null);
        assert!(row["created_at"].is_string());
        assert!(row["updated_at"].is_string());
    }

    #[tokio::test]
    async fn missing_required_value_is_a_persistence_error() {
        let provider = MemorySessionProvider::new();
        let mut s = provider.acquire().await.unwrap();
        let err = s.insert(&user(), &Record::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn uncommitted_changes_are_discarded() {
        let provider = MemorySessionProvider::new();
        {
            let mut s = provider.acquire().await.unwrap();
            s.insert(&user(), &record(json!({ "name": "Ada" }))).await.unwrap();
        }
        assert_eq!(provider.row_count("user").unwrap(), 0);

        let mut s = provider.acquire().await.unwrap();
        s.insert(&user(), &record(json!({ "name": "Ada" }))).await.unwrap();
        s.commit().await.unwrap();
        assert_eq!(provider.row_count("user").unwrap(), 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated_until_commit() {
        let provider = MemorySessionProvider::new();
        let mut writer = provider.acquire().await.unwrap();
        let row = writer.insert(&user(), &record(json!({ "name": "Ada" }))).await.unwrap();
        let pk = row["uuid"].clone();

        let mut reader = provider.acquire().await.unwrap();
        assert_eq!(reader.select_one(&user(), &pk).await.unwrap(), None);
        writer.commit().await.unwrap();

        let mut fresh = provider.acquire().await.unwrap();
        assert_eq!(fresh.select_one(&user(), &pk).await.unwrap(), Some(row));
    }

    #[tokio::test]
    async fn sequence_keys_order_numerically() {
        let provider = MemorySessionProvider::new();
        let mut s = provider.acquire().await.unwrap();
        for i in 0..12 {
            s.insert(&entry(), &record(json!({ "note": format!("n{}", i) }))).await.unwrap();
        }
        let page = s
            .select_page(&entry(), &PaginationRequest { skip: 9, limit: Some(2) })
            .await
            .unwrap();
        let ids: Vec<i64> = page.iter().filter_map(|r| r["id"].as_i64()).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[tokio::test]
    async fn update_touches_given_fields_and_refresh_columns() {
        let provider = MemorySessionProvider::new();
        let mut s = provider.acquire().await.unwrap();
        let row = s
            .insert(&user(), &record(json!({ "name": "Ada", "email": "ada@example.com" })))
            .await
            .unwrap();
        let pk = row["uuid"].clone();
        let updated = s
            .update(&user(), &pk, &record(json!({ "name": "Lovelace" })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["name"], json!("Lovelace"));
        assert_eq!(updated["email"], json!("ada@example.com"));
        assert_eq!(updated["created_at"], row["created_at"]);
        assert_eq!(updated["uuid"], pk);

        let missing = json!(uuid::Uuid::new_v4().to_string());
        assert_eq!(s.update(&user(), &missing, &Record::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_and_delete_all() {
        let provider = MemorySessionProvider::new();
        let mut s = provider.acquire().await.unwrap();
        let a = s.insert(&entry(), &record(json!({ "note": "a" }))).await.unwrap();
        s.insert(&entry(), &record(json!({ "note": "b" }))).await.unwrap();
        s.commit().await.unwrap();

        let mut s = provider.acquire().await.unwrap();
        assert_eq!(s.delete(&entry(), &a["id"]).await.unwrap(), Some(a.clone()));
        assert_eq!(s.delete(&entry(), &a["id"]).await.unwrap(), None);
        assert_eq!(s.delete_all(&entry()).await.unwrap(), 1);
        assert!(s.select_page(&entry(), &PaginationRequest::unbounded()).await.unwrap().is_empty());
        s.commit().await.unwrap();
        assert_eq!(provider.row_count("entry").unwrap(), 0);
    }
}
