//! Discovery routes: GET /ddl and GET /ddl/:name.

use crate::handlers::ddl::{get_table, list_tables};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn ddl_routes(state: AppState) -> Router {
    Router::new()
        .route("/ddl", get(list_tables))
        .route("/ddl/:name", get(get_table))
        .with_state(state)
}
