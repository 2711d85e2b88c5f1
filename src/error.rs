//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid primary key: table {table} column {column}")]
    InvalidPrimaryKey { table: String, column: String },
    #[error("entity {0} has no columns")]
    NoColumns(String),
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("reserved path segment: {0}")]
    ReservedPathSegment(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bad params: {0}")]
    BadParams(String),
    #[error("not found")]
    NotFound,
    #[error("insert failed: {0}")]
    InsertFailed(String),
    #[error("update failed: {0}")]
    UpdateFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("marshal failed: {0}")]
    MarshalFailed(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Raw failure reported by a [`Store`](crate::store::Store); the CRUD service translates it per operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    /// Column value that could not be turned into JSON.
    #[error("decode {column}: {reason}")]
    Decode { column: String, reason: String },
    /// Constraint or backend rejection not coming from sqlx.
    #[error("{0}")]
    Rejected(String),
}

/// How error kinds are turned into HTTP status codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorMapping {
    /// Distinct status per kind (400/403/404/500).
    #[default]
    Typed,
    /// Every kind is reported as 400 Bad Request.
    Uniform,
}

impl std::str::FromStr for ErrorMapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "typed" => Ok(ErrorMapping::Typed),
            "uniform" => Ok(ErrorMapping::Uniform),
            other => Err(ConfigError::Invalid {
                name: "ERROR_MAPPING",
                reason: format!("expected typed or uniform, got {}", other),
            }),
        }
    }
}

impl AppError {
    pub fn status(&self, mapping: ErrorMapping) -> StatusCode {
        if mapping == ErrorMapping::Uniform {
            return StatusCode::BAD_REQUEST;
        }
        match self {
            AppError::BadParams(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Config(_)
            | AppError::InsertFailed(_)
            | AppError::UpdateFailed(_)
            | AppError::DeleteFailed(_)
            | AppError::MarshalFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render with an explicit status mapping.
    pub fn into_response_with(self, mapping: ErrorMapping) -> Response {
        let status = self.status(mapping);
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(ErrorMapping::Typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_mapping_separates_client_and_server_errors() {
        let m = ErrorMapping::Typed;
        assert_eq!(AppError::BadParams("x".into()).status(m), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound.status(m), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("no".into()).status(m), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InsertFailed("x".into()).status(m), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::DeleteFailed("x".into()).status(m), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn uniform_mapping_is_always_bad_request() {
        let m = ErrorMapping::Uniform;
        for e in [
            AppError::NotFound,
            AppError::InsertFailed("x".into()),
            AppError::UpdateFailed("x".into()),
            AppError::MarshalFailed("x".into()),
        ] {
            assert_eq!(e.status(m), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn parses_mapping_names() {
        assert_eq!("Uniform".parse::<ErrorMapping>().unwrap(), ErrorMapping::Uniform);
        assert_eq!("typed".parse::<ErrorMapping>().unwrap(), ErrorMapping::Typed);
        assert!("loud".parse::<ErrorMapping>().is_err());
    }
}
