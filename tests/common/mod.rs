#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use crudapi::{
    build_router, FieldDef, FieldDefault, FieldKind, MemorySessionProvider, ModelDefinition, ModelRegistry, Settings,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub fn registry() -> ModelRegistry {
    let user = ModelDefinition::new("users", "User")
        .field(FieldDef::new("name", FieldKind::Text))
        .field(FieldDef::new("email", FieldKind::Text).nullable())
        .managed_timestamps();
    let entry = ModelDefinition::new("audit", "AuditEntry")
        .with_primary_key(FieldDef::new("id", FieldKind::BigInt).default(FieldDefault::Sequence))
        .field(FieldDef::new("action", FieldKind::Text));
    ModelRegistry::new()
        .with(user)
        .and_then(|r| r.with(entry))
        .expect("registry")
}

pub fn app_with(settings: &Settings) -> (Router, MemorySessionProvider) {
    let provider = MemorySessionProvider::new();
    let router = build_router(&registry(), Arc::new(provider.clone()), settings).expect("router");
    (router, provider)
}

pub fn app() -> Router {
    app_with(&Settings::default()).0
}

/// Send one request and decode the JSON answer (Null for an empty body).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
