//! PostgreSQL sessions: one transaction per session.

use super::{Record, Session, SessionProvider};
use crate::error::AppError;
use crate::model::{FieldKind, ModelDefinition};
use crate::pagination::PaginationRequest;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};

#[derive(Clone)]
pub struct PgSessionProvider {
    pool: PgPool,
}

impl PgSessionProvider {
    pub fn new(pool: PgPool) -> Self {
        PgSessionProvider { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionProvider for PgSessionProvider {
    async fn acquire(&self) -> Result<Box<dyn Session>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }
}

/// Rolled back on drop unless committed.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl PgSession {
    async fn fetch_optional(&mut self, model: &ModelDefinition, q: &QueryBuf) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.bound() {
            query = query.bind(p);
        }
        let row = query.fetch_optional(&mut *self.tx).await?;
        row.map(|r| row_to_record(model, &r)).transpose()
    }

    async fn fetch_all(&mut self, model: &ModelDefinition, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.bound() {
            query = query.bind(p);
        }
        let rows = query.fetch_all(&mut *self.tx).await?;
        rows.iter().map(|r| row_to_record(model, r)).collect()
    }
}

#[async_trait]
impl Session for PgSession {
    async fn select_page(&mut self, model: &ModelDefinition, page: &PaginationRequest) -> Result<Vec<Record>, AppError> {
        let q = sql::select_page(model, page);
        self.fetch_all(model, &q).await
    }

    async fn select_one(&mut self, model: &ModelDefinition, pk: &Value) -> Result<Option<Record>, AppError> {
        let q = sql::select_by_pk(model, pk);
        self.fetch_optional(model, &q).await
    }

    async fn insert(&mut self, model: &ModelDefinition, values: &Record) -> Result<Record, AppError> {
        let q = sql::insert(model, values);
        self.fetch_optional(model, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&mut self, model: &ModelDefinition, pk: &Value, values: &Record) -> Result<Option<Record>, AppError> {
        let q = sql::update(model, pk, values);
        self.fetch_optional(model, &q).await
    }

    async fn delete(&mut self, model: &ModelDefinition, pk: &Value) -> Result<Option<Record>, AppError> {
        let q = sql::delete(model, pk);
        self.fetch_optional(model, &q).await
    }

    async fn delete_all(&mut self, model: &ModelDefinition) -> Result<u64, AppError> {
        let q = sql::delete_all(model);
        tracing::debug!(sql = %q.sql, "query");
        let done = sqlx::query(&q.sql).execute(&mut *self.tx).await?;
        Ok(done.rows_affected())
    }

    async fn ping(&mut self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn row_to_record(model: &ModelDefinition, row: &PgRow) -> Result<Record, AppError> {
    let mut map = Record::new();
    for f in &model.fields {
        map.insert(f.name.clone(), cell_to_value(row, &f.name, f.kind)?);
    }
    Ok(map)
}

fn cell_to_value(row: &PgRow, name: &str, kind: FieldKind) -> Result<Value, sqlx::Error> {
    let v = match kind {
        FieldKind::Uuid => row
            .try_get::<Option<uuid::Uuid>, _>(name)?
            .map(|u| Value::String(u.to_string())),
        FieldKind::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        FieldKind::Int => row.try_get::<Option<i32>, _>(name)?.map(|n| Value::Number(n.into())),
        FieldKind::BigInt => row.try_get::<Option<i64>, _>(name)?.map(|n| Value::Number(n.into())),
        FieldKind::Float => row
            .try_get::<Option<f64>, _>(name)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldKind::Bool => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        FieldKind::Timestamp => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(d.to_rfc3339())),
        FieldKind::Json => row.try_get::<Option<Value>, _>(name)?,
    };
    Ok(v.unwrap_or(Value::Null))
}
