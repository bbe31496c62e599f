mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{app, registry, send};
use crudapi::{build_router, AppError, Session, SessionProvider, Settings};
use serde_json::{json, Value};
use std::sync::Arc;

/// A store that is never reachable.
struct Unreachable;

#[async_trait]
impl SessionProvider for Unreachable {
    async fn acquire(&self) -> Result<Box<dyn Session>, AppError> {
        Err(AppError::Persistence("connection refused".into()))
    }
}

#[tokio::test]
async fn health_is_ok_with_an_empty_body() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn unreachable_store_fails_without_detail() {
    let app = build_router(&registry(), Arc::new(Unreachable), &Settings::default()).expect("router");
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "GET", "/users/User", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Internal Server Error" }));
}

#[tokio::test]
async fn openapi_document_lists_generated_schemas() {
    let (status, doc) = send(&app(), "GET", "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    let schemas = doc["components"]["schemas"].as_object().expect("schemas");
    for name in ["usersUser", "usersUserCreate", "usersUserUpdate", "auditAuditEntry"] {
        assert!(schemas.contains_key(name), "missing {}", name);
    }
    assert!(doc["paths"].get("/users/User/{uuid}").is_some());
}
