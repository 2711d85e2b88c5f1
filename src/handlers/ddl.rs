//! Discovery handlers: registered entities, their endpoints and columns.

use crate::error::AppError;
use crate::response::TableInfo;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

pub async fn list_tables(State(state): State<AppState>) -> Response {
    let tables: Vec<TableInfo> = state
        .registry
        .entities()
        .iter()
        .map(|e| TableInfo::from_entity(e, &state.api_prefix))
        .collect();
    state.respond(Ok::<_, AppError>(Json(tables)))
}

/// Lookup by table name or path segment.
pub async fn get_table(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let result = state
        .registry
        .entity_by_name_or_path(&name)
        .map(|e| Json(TableInfo::from_entity(e, &state.api_prefix)))
        .ok_or(AppError::NotFound);
    state.respond(result)
}
