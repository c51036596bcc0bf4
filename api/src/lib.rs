use std::sync::Arc;

mod core;
mod error_handler;
mod routes;

pub use crate::core::app_state::{AppState, ConfigError, Settings};
pub use crate::error_handler::{AppError, AppResult};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

use crate::routes::{find_config::find_config_route::find_config_route, health_route::health};

/// Builds the HTTP router for the config extension.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(find_config_route))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Binds `settings.address` and serves until Ctrl+C.
pub async fn start(settings: Settings) -> AppResult<()> {
    let address = settings.address.clone();
    let app = router(Arc::new(AppState::new(settings)));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "config extension listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
