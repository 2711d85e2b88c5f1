//! Process settings read from the environment (after `.env` is loaded).

use crate::error::{ConfigError, ErrorMapping};
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Mount point for entity and ddl routes, e.g. `/api/v1`. Empty mounts at root.
    pub api_prefix: String,
    pub db_schema: String,
    /// JSON entity file; when unset the schema is introspected.
    pub entities_path: Option<PathBuf>,
    pub max_connections: u32,
    pub body_limit_bytes: usize,
    pub error_mapping: ErrorMapping,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Invalid {
            name: "DATABASE_URL",
            reason: "not set".into(),
        })?;
        let api_prefix = normalize_prefix(&get("API_PREFIX").unwrap_or_default());
        let max_connections = match get("MAX_CONNECTIONS") {
            Some(v) => parse_positive("MAX_CONNECTIONS", &v)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let body_limit_bytes = match get("BODY_LIMIT_BYTES") {
            Some(v) => parse_positive("BODY_LIMIT_BYTES", &v)?,
            None => DEFAULT_BODY_LIMIT_BYTES,
        };
        let error_mapping = match get("ERROR_MAPPING") {
            Some(v) => v.parse()?,
            None => ErrorMapping::default(),
        };

        Ok(Settings {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            api_prefix,
            db_schema: get("DB_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into()),
            entities_path: get("ENTITIES_PATH").map(PathBuf::from),
            max_connections,
            body_limit_bytes,
            error_mapping,
        })
    }
}

fn parse_positive<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a positive integer, got {}", value),
        }),
    }
}

/// `api/v1/` -> `/api/v1`; `/` -> empty.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
