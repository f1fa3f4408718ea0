use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roster_core::ThreadRandom;
use roster_server::api;
use roster_server::config::Config;
use roster_server::repository::SqliteRepository;
use roster_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    info!("Using database: {}", config.db_path.display());
    let repository = SqliteRepository::new(&config.db_path)?;

    let state = Arc::new(AppState::new(
        Arc::new(repository),
        Arc::new(ThreadRandom),
    ));

    let app = api::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
