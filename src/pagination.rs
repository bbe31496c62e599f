//! skip / limit query validation. Runs before any database access; never clamps.

use crate::error::{FieldError, ValidationError};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginationRequest {
    pub skip: u64,
    /// None means unbounded.
    pub limit: Option<u64>,
}

impl PaginationRequest {
    pub fn unbounded() -> Self {
        PaginationRequest { skip: 0, limit: None }
    }

    /// Read `skip` and `limit` from a query map; other keys are ignored.
    pub fn from_query(params: &HashMap<String, String>, max_limit: Option<u64>) -> Result<Self, ValidationError> {
        validate(
            params.get("skip").map(String::as_str),
            params.get("limit").map(String::as_str),
            max_limit,
        )
    }
}

fn parse_int(field: &str, raw: &str) -> Result<i64, FieldError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FieldError::new(&["query", field], "value is not a valid integer", "type_error.integer"))
}

/// `skip` defaults to 0 and must be >= 0. `limit` defaults to `max_limit` (possibly unbounded),
/// must be > 0 and must not exceed `max_limit` when one is configured.
pub fn validate(
    skip_raw: Option<&str>,
    limit_raw: Option<&str>,
    max_limit: Option<u64>,
) -> Result<PaginationRequest, ValidationError> {
    let mut errors = Vec::new();

    let skip = match skip_raw.map(|s| parse_int("skip", s)) {
        None => Some(0),
        Some(Ok(n)) if n >= 0 => Some(n as u64),
        Some(Ok(_)) => {
            errors.push(FieldError::new(&["query", "skip"], "must be >= 0", "value_error.number.not_ge"));
            None
        }
        Some(Err(e)) => {
            errors.push(e);
            None
        }
    };

    let limit = match limit_raw.map(|s| parse_int("limit", s)) {
        None => Some(max_limit),
        Some(Ok(n)) if n <= 0 => {
            errors.push(FieldError::new(&["query", "limit"], "must be > 0", "value_error.number.not_gt"));
            None
        }
        Some(Ok(n)) => match max_limit {
            Some(max) if n as u64 > max => {
                errors.push(FieldError::new(
                    &["query", "limit"],
                    format!("must be <= {}", max),
                    "value_error.number.not_le",
                ));
                None
            }
            _ => Some(Some(n as u64)),
        },
        Some(Err(e)) => {
            errors.push(e);
            None
        }
    };

    match (skip, limit) {
        (Some(skip), Some(limit)) if errors.is_empty() => Ok(PaginationRequest { skip, limit }),
        _ => Err(ValidationError { errors }),
    }
}
