//! Standalone server: every table of a PostgreSQL schema (or of an entity file) behind CRUD routes.
//!
//! Run from repo root: `cargo run -p tablerest-server`
//! Settings come from the environment or a `.env` file (`DATABASE_URL` is required).

use std::sync::Arc;
use tablerest::{app_router, load_entities, AppState, Hooks, PgStore, Registry, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tablerest=info,tablerest_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let entities = load_entities(&pool, &settings).await?;
    let registry = Registry::builder().entities(entities).build()?;
    tracing::info!(
        entities = registry.len(),
        schema = %settings.db_schema,
        source = if settings.entities_path.is_some() { "file" } else { "introspection" },
        "registry loaded"
    );

    let state = AppState::new(Arc::new(PgStore::new(pool)), registry, Hooks::default())
        .with_error_mapping(settings.error_mapping)
        .with_api_prefix(settings.api_prefix.clone());
    let app = app_router(state, settings.body_limit_bytes);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
