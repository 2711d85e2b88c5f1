//! Shared application state for all routes. Everything in it is immutable after startup.

use crate::config::Registry;
use crate::error::{AppError, ErrorMapping};
use crate::hooks::Hooks;
use crate::store::Store;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub registry: Arc<Registry>,
    pub hooks: Hooks,
    pub error_mapping: ErrorMapping,
    /// Mount point of the entity routes, reported by `/ddl`.
    pub api_prefix: String,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, registry: Registry, hooks: Hooks) -> Self {
        AppState {
            store,
            registry: Arc::new(registry),
            hooks,
            error_mapping: ErrorMapping::default(),
            api_prefix: String::new(),
        }
    }

    pub fn with_error_mapping(mut self, mapping: ErrorMapping) -> Self {
        self.error_mapping = mapping;
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Render a handler result, applying the configured error mapping.
    pub fn respond<T: IntoResponse>(&self, result: Result<T, AppError>) -> Response {
        match result {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response_with(self.error_mapping),
        }
    }
}
