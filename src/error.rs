//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// One entry of a 422 body: where the problem is, what it is, and its machine-readable kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: impl Into<String>, kind: impl Into<String>) -> Self {
        FieldError {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

/// Malformed pagination, path key or request body. Raised before any database access.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("validation failed: {}", describe(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(loc: &[&str], msg: impl Into<String>, kind: impl Into<String>) -> Self {
        ValidationError {
            errors: vec![FieldError::new(loc, msg, kind)],
        }
    }

    /// The first error reported for the given location, if any.
    pub fn at(&self, loc: &[&str]) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.loc.iter().map(String::as_str).eq(loc.iter().copied()))
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaDerivationError {
    #[error("schema {schema}: field '{field}' declared more than once")]
    DuplicateField { schema: String, field: String },
    #[error("schema {schema}: no fields left after exclusions")]
    NoFields { schema: String },
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("model {model}: primary key field '{field}' is not declared")]
    MissingPrimaryKey { model: String, field: String },
    #[error("model {model}: primary key '{field}' must be a non-nullable uuid, text, int or big_int")]
    UnsupportedPrimaryKey { model: String, field: String },
    #[error("model {model}: field '{field}' is filled by the server but has no default")]
    NoServerValue { model: String, field: String },
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error(transparent)]
    Schema(#[from] SchemaDerivationError),
    #[error("model load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Holds the lowercase model name.
    #[error("{0} not found")]
    NotFound(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("persistence: {0}")]
    Persistence(String),
}

#[derive(Serialize)]
struct DetailBody<T: Serialize> {
    detail: T,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(DetailBody { detail: e.errors }),
            )
                .into_response(),
            AppError::NotFound(model) => (
                StatusCode::NOT_FOUND,
                Json(DetailBody {
                    detail: format!("{} not found", model),
                }),
            )
                .into_response(),
            AppError::Db(_) | AppError::Persistence(_) => {
                tracing::error!(error = %self, "persistence failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(DetailBody {
                        detail: "Internal Server Error",
                    }),
                )
                    .into_response()
            }
        }
    }
}
