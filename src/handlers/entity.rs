//! Entity CRUD handlers: list, read, create, update, delete.

use crate::config::{PkType, ResolvedEntity};
use crate::error::AppError;
use crate::hooks::Action;
use crate::service::{CrudService, PageRequest};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn parse_id(id_str: &str, pk_type: &PkType) -> Result<Value, AppError> {
    Ok(match pk_type {
        PkType::Uuid => {
            let u = uuid::Uuid::parse_str(id_str).map_err(|_| AppError::BadParams("invalid uuid".into()))?;
            Value::String(u.to_string())
        }
        PkType::Int => {
            let n: i64 = id_str.parse().map_err(|_| AppError::BadParams("invalid id".into()))?;
            Value::Number(n.into())
        }
        PkType::Text => Value::String(id_str.to_string()),
    })
}

fn parse_body(body: &Bytes) -> Result<Value, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadParams(format!("invalid JSON body: {}", e)))
}

/// Resolve the entity for `path_segment` and run the request hooks for `action`.
async fn admit<'a>(
    state: &'a AppState,
    path_segment: &str,
    action: Action,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<&'a ResolvedEntity, AppError> {
    let entity = state
        .registry
        .entity_by_path(path_segment)
        .ok_or(AppError::NotFound)?;
    state.hooks.check(method, uri, headers, &entity.name, action).await?;
    Ok(entity)
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result: Result<_, AppError> = async {
        let entity = admit(&state, &path_segment, Action::RetrieveMany, method, uri, headers).await?;
        let page = PageRequest::from_query(&params)?;
        let results = CrudService::list(state.store.as_ref(), entity, &page).await?;
        Ok(Json(results))
    }
    .await;
    state.respond(result)
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let result: Result<_, AppError> = async {
        let entity = admit(&state, &path_segment, Action::RetrieveOne, method, uri, headers).await?;
        let id = parse_id(&id_str, &entity.pk_type)?;
        let row = CrudService::read(state.store.as_ref(), entity, &id).await?;
        Ok(Json(row))
    }
    .await;
    state.respond(result)
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result: Result<_, AppError> = async {
        let entity = admit(&state, &path_segment, Action::Create, method, uri, headers).await?;
        let body = parse_body(&body)?;
        let hooks = state.registry.hooks_for(entity);
        let row = CrudService::create(state.store.as_ref(), entity, hooks, body).await?;
        Ok(Json(row))
    }
    .await;
    state.respond(result)
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result: Result<_, AppError> = async {
        let entity = admit(&state, &path_segment, Action::Update, method, uri, headers).await?;
        let id = parse_id(&id_str, &entity.pk_type)?;
        let body = parse_body(&body)?;
        let row = CrudService::update(state.store.as_ref(), entity, &id, body).await?;
        Ok(Json(row))
    }
    .await;
    state.respond(result)
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let result: Result<_, AppError> = async {
        let entity = admit(&state, &path_segment, Action::Delete, method, uri, headers).await?;
        let id = parse_id(&id_str, &entity.pk_type)?;
        let affected = CrudService::delete(state.store.as_ref(), entity, &id).await?;
        Ok(Json(affected))
    }
    .await;
    state.respond(result)
}
