//! Generic CRUD execution over a scoped session. Results are read-schema projections.

use crate::error::AppError;
use crate::pagination::PaginationRequest;
use crate::routes::RouteGroup;
use crate::session::{Record, Session};
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// Rows ordered by primary key ascending, skip / limit applied.
    pub async fn list(
        session: &mut dyn Session,
        group: &RouteGroup,
        page: &PaginationRequest,
    ) -> Result<Vec<Record>, AppError> {
        let rows = session.select_page(&group.model, page).await?;
        Ok(rows.iter().map(|r| group.schemas.read.project(r)).collect())
    }

    /// Insert one validated create-schema record. Returns the stored row, server-assigned
    /// fields included.
    pub async fn create(session: &mut dyn Session, group: &RouteGroup, body: &Record) -> Result<Record, AppError> {
        let row = session.insert(&group.model, body).await?;
        let pk = row.get(&group.model.primary_key).cloned().unwrap_or_default();
        tracing::debug!(model = %group.model.name, pk = %pk, "created");
        Ok(group.schemas.read.project(&row))
    }

    /// Delete every row, then list again without pagination in the same session.
    pub async fn delete_all(session: &mut dyn Session, group: &RouteGroup) -> Result<Vec<Record>, AppError> {
        let removed = session.delete_all(&group.model).await?;
        tracing::debug!(model = %group.model.name, removed, "deleted all");
        Self::list(session, group, &PaginationRequest::unbounded()).await
    }

    pub async fn get_one(session: &mut dyn Session, group: &RouteGroup, pk: &Value) -> Result<Record, AppError> {
        session
            .select_one(&group.model, pk)
            .await?
            .map(|row| group.schemas.read.project(&row))
            .ok_or_else(|| group.not_found())
    }

    /// Partial update: only fields present in `body` are overwritten. The key never changes.
    pub async fn update_one(
        session: &mut dyn Session,
        group: &RouteGroup,
        pk: &Value,
        body: &Record,
    ) -> Result<Record, AppError> {
        Self::get_one(session, group, pk).await?;
        let mut values = body.clone();
        values.remove(&group.model.primary_key);
        session
            .update(&group.model, pk, &values)
            .await?
            .map(|row| group.schemas.read.project(&row))
            .ok_or_else(|| group.not_found())
    }

    /// Returns the removed row.
    pub async fn delete_one(session: &mut dyn Session, group: &RouteGroup, pk: &Value) -> Result<Record, AppError> {
        let existing = Self::get_one(session, group, pk).await?;
        session.delete(&group.model, pk).await?.ok_or_else(|| group.not_found())?;
        Ok(existing)
    }
}
