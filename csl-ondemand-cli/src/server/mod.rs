//! HTTP hosting of the CSL service.
//!
//! Routes, below the configured prefix:
//!
//! - `GET  /match?icao=&airline=&livery=` redirects to the matching bundle
//! - `GET  /pack/{root}/{id}` returns the bundle as `multipart/mixed`
//! - `POST /admin/rebuild` reloads the cache and returns the summary as JSON
//! - `GET  /{path}` returns a single file below the CSL directory

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use csl_ondemand::service::CslService;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CslService>,
    /// Route prefix, empty or starting with `/`.
    pub prefix: String,
    /// Serve textures by reference below this URL instead of embedding them.
    pub texture_base_url: Option<String>,
    /// Cancelled on shutdown; requests derive their cancellation from it.
    pub shutdown: CancellationToken,
}

/// Build the router for `state`.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/match", get(handlers::find_match))
        .route("/pack/*key", get(handlers::get_bundle))
        .route("/admin/rebuild", post(handlers::rebuild))
        .route("/*path", get(handlers::get_resource));

    let router = if state.prefix.is_empty() {
        api
    } else {
        Router::new().nest(&state.prefix, api)
    };
    router.with_state(state)
}

/// Serve until `state.shutdown` is cancelled.
pub async fn serve(state: AppState, bind: SocketAddr) -> Result<(), CliError> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| CliError::Server(format!("failed to bind {}: {}", bind, e)))?;
    let shutdown = state.shutdown.clone();
    info!(address = %bind, prefix = %state.prefix, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    info!("HTTP server stopped");
    Ok(())
}
