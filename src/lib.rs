//! tablerest: generic REST CRUD over registered PostgreSQL tables.

pub mod config;
pub mod error;
pub mod hooks;
pub mod response;
pub mod sql;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{introspect, load_entities, resolve, ColumnInfo, Registry, ResolvedEntity, Settings};
pub use error::{AppError, ConfigError, ErrorMapping, StoreError};
pub use hooks::{Action, ContextInitializer, EntityHooks, Hooks, RequestContext, RequestValidator};
pub use response::{PagedResults, TableInfo};
pub use state::AppState;
pub use store::{PgStore, Record, Store};
pub use routes::{app_router, common_routes, ddl_routes, entity_routes};
pub use service::{CrudService, PageRequest};
