//! Database session provider: one scoped session per request.
//!
//! A session is a unit of work. Changes become visible to other sessions only on
//! [`Session::commit`]; dropping a session without committing (early return, error,
//! cancelled request) rolls back everything it did.

mod memory;
mod postgres;

pub use memory::MemorySessionProvider;
pub use postgres::{PgSession, PgSessionProvider};

use crate::error::AppError;
use crate::model::ModelDefinition;
use crate::pagination::PaginationRequest;
use async_trait::async_trait;
use serde_json::Value;

/// A stored row: column name to JSON value.
pub type Record = serde_json::Map<String, Value>;

#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// Open a new scoped session.
    async fn acquire(&self) -> Result<Box<dyn Session>, AppError>;
}

#[async_trait]
pub trait Session: Send {
    /// Rows ordered by primary key ascending, with skip / limit applied.
    async fn select_page(
        &mut self,
        model: &ModelDefinition,
        page: &PaginationRequest,
    ) -> Result<Vec<Record>, AppError>;

    async fn select_one(&mut self, model: &ModelDefinition, pk: &Value) -> Result<Option<Record>, AppError>;

    /// Persist a new row and return it as stored, server-assigned fields included.
    async fn insert(&mut self, model: &ModelDefinition, values: &Record) -> Result<Record, AppError>;

    /// Overwrite the given fields of one row and return it as stored. None when absent.
    async fn update(
        &mut self,
        model: &ModelDefinition,
        pk: &Value,
        values: &Record,
    ) -> Result<Option<Record>, AppError>;

    /// Remove one row and return it. None when absent.
    async fn delete(&mut self, model: &ModelDefinition, pk: &Value) -> Result<Option<Record>, AppError>;

    /// Remove every row of the model's table. Returns the number removed.
    async fn delete_all(&mut self, model: &ModelDefinition) -> Result<u64, AppError>;

    /// Round-trip to the store.
    async fn ping(&mut self) -> Result<(), AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
