//! Environment settings and logging bootstrap.

use crate::error::SettingsError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default request body ceiling (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// tracing filter directive derived from LOG_LEVEL.
    pub log_level: String,
    pub debug: bool,
    pub api_host: String,
    pub api_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Ceiling for `limit`; None means unbounded.
    pub max_limit: Option<u64>,
    /// Mount point of the generated routes, e.g. "/api". Empty mounts at the root.
    pub api_prefix: String,
    pub body_limit: usize,
    /// Optional JSON file with additional model definitions.
    pub models_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log_level: "info".into(),
            debug: false,
            api_host: "0.0.0.0".into(),
            api_port: 8000,
            database_url: "postgres://localhost/crudapi".into(),
            database_max_connections: 5,
            max_limit: None,
            api_prefix: String::new(),
            body_limit: DEFAULT_BODY_LIMIT,
            models_path: None,
        }
    }
}

/// Map a LOG_LEVEL value (Python-style names accepted) to a tracing level.
fn log_level(raw: &str) -> Result<&'static str, SettingsError> {
    Ok(match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => {
            return Err(SettingsError::Invalid {
                key: "LOG_LEVEL",
                value: raw.to_string(),
            })
        }
    })
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, SettingsError> {
    raw.trim()
        .parse()
        .map_err(|_| SettingsError::Invalid { key, value: raw })
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

impl Settings {
    /// Read from the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, SettingsError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, ".env not loaded");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();
        if let Some(v) = lookup("LOG_LEVEL") {
            s.log_level = log_level(&v)?.to_string();
            s.debug = s.log_level == "debug" || s.log_level == "trace";
        }
        if let Some(v) = lookup("CRUDAPI_HOST") {
            s.api_host = v;
        }
        if let Some(v) = lookup("CRUDAPI_PORT") {
            s.api_port = parse("CRUDAPI_PORT", v)?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            s.database_max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("CRUDAPI_MAX_LIMIT").filter(|v| !v.trim().is_empty()) {
            let n: u64 = parse("CRUDAPI_MAX_LIMIT", v.clone())?;
            if n == 0 {
                return Err(SettingsError::Invalid { key: "CRUDAPI_MAX_LIMIT", value: v });
            }
            s.max_limit = Some(n);
        }
        if let Some(v) = lookup("CRUDAPI_PREFIX") {
            s.api_prefix = normalize_prefix(&v);
        }
        if let Some(v) = lookup("CRUDAPI_BODY_LIMIT") {
            s.body_limit = parse("CRUDAPI_BODY_LIMIT", v)?;
        }
        s.models_path = lookup("CRUDAPI_MODELS")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Ok(s)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Install the global tracing subscriber. RUST_LOG wins over LOG_LEVEL when set.
pub fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(settings.debug)
        .init();
}
