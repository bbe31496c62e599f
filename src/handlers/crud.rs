//! The six handlers of a route group. Input is validated before a session is acquired;
//! writes are committed, reads let the session roll back on drop.

use crate::error::{AppError, ValidationError};
use crate::pagination::PaginationRequest;
use crate::schema::DerivedSchema;
use crate::service::CrudService;
use crate::session::Record;
use crate::state::CrudState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Parse and validate a JSON request body against a derived schema.
fn parse_body(schema: &DerivedSchema, body: &Bytes) -> Result<Record, ValidationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::single(&["body"], e.to_string(), "value_error.jsondecode"))?;
    schema.validate(&value)
}

pub async fn list(
    State(state): State<CrudState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Record>>, AppError> {
    let page = PaginationRequest::from_query(&params, state.max_limit)?;
    let mut session = state.provider.acquire().await?;
    let rows = CrudService::list(session.as_mut(), &state.group, &page).await?;
    Ok(Json(rows))
}

pub async fn create(State(state): State<CrudState>, body: Bytes) -> Result<Json<Record>, AppError> {
    let values = parse_body(&state.group.schemas.create, &body)?;
    let mut session = state.provider.acquire().await?;
    let row = CrudService::create(session.as_mut(), &state.group, &values).await?;
    session.commit().await?;
    Ok(Json(row))
}

pub async fn delete_all(State(state): State<CrudState>) -> Result<Json<Vec<Record>>, AppError> {
    let mut session = state.provider.acquire().await?;
    let rows = CrudService::delete_all(session.as_mut(), &state.group).await?;
    session.commit().await?;
    tracing::info!(model = %state.group.model.name, "all rows deleted");
    Ok(Json(rows))
}

pub async fn get_one(State(state): State<CrudState>, Path(raw): Path<String>) -> Result<Json<Record>, AppError> {
    let pk = state.group.parse_pk(&raw)?;
    let mut session = state.provider.acquire().await?;
    let row = CrudService::get_one(session.as_mut(), &state.group, &pk).await?;
    Ok(Json(row))
}

pub async fn update_one(
    State(state): State<CrudState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<Json<Record>, AppError> {
    let pk = state.group.parse_pk(&raw)?;
    let values = parse_body(&state.group.schemas.update, &body)?;
    let mut session = state.provider.acquire().await?;
    let row = CrudService::update_one(session.as_mut(), &state.group, &pk, &values).await?;
    session.commit().await?;
    Ok(Json(row))
}

pub async fn delete_one(State(state): State<CrudState>, Path(raw): Path<String>) -> Result<Json<Record>, AppError> {
    let pk = state.group.parse_pk(&raw)?;
    let mut session = state.provider.acquire().await?;
    let row = CrudService::delete_one(session.as_mut(), &state.group, &pk).await?;
    session.commit().await?;
    Ok(Json(row))
}
