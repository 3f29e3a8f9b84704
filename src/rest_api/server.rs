//! Axum HTTP server for the REST API

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::deployer::Deployer;
use crate::{Error, Result};

use super::handlers;

/// Metrics endpoint handler
#[cfg(feature = "metrics")]
async fn metrics_handler() -> std::result::Result<String, (axum::http::StatusCode, String)> {
    crate::metrics::encode_registry()
        .map_err(|e| (axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

pub fn router(deployer: Arc<Deployer>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/apps/{name}",
            get(handlers::app_status)
                .post(handlers::deploy_app)
                .delete(handlers::destroy_app),
        )
        .route("/api/v1/apps/{name}/restart", post(handlers::restart_app));

    #[cfg(feature = "metrics")]
    let router = router.route("/metrics", get(metrics_handler));

    router
        .layer(TraceLayer::new_for_http())
        .with_state(deployer)
}

/// Run the REST API server until the process is interrupted
pub async fn run_server(deployer: Arc<Deployer>, addr: SocketAddr) -> Result<()> {
    let app = router(deployer);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::SetupError(format!("failed to bind {addr}: {e}")))?;
    info!("REST API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .map_err(|e| Error::SetupError(format!("REST API server error: {e}")))?;

    Ok(())
}
