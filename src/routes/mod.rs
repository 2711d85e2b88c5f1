//! Router assembly: common, discovery and entity routes under one prefix.

mod common;
mod ddl;
mod entity;

pub use common::common_routes;
pub use ddl::ddl_routes;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Full application router. Entity and ddl routes are nested under `state.api_prefix`
/// (empty mounts them at the root); common routes always live at the root.
pub fn app_router(state: AppState, body_limit_bytes: usize) -> Router {
    let api = Router::new()
        .merge(ddl_routes(state.clone()))
        .merge(entity_routes(state.clone()));
    let prefix = state.api_prefix.clone();
    let app = if prefix.is_empty() {
        Router::new().merge(common_routes(state)).merge(api)
    } else {
        Router::new().merge(common_routes(state)).nest(&prefix, api)
    };
    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(body_limit_bytes)),
    )
}
