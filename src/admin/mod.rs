pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::engine::RotationEngine;

#[derive(Clone)]
pub struct AdminState {
    pub engine: Arc<RotationEngine>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(engine: Arc<RotationEngine>, api_key: &str) -> Self {
        Self {
            engine,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/snapshot", get(get_snapshot))
        .route("/admin/reset-errors", post(reset_errors))
        .route("/admin/endpoints/{group}/{name}/offline", post(mark_offline))
        .route("/admin/endpoints/{group}/{name}/reactivate", post(reactivate))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API on `addr` until the shutdown signal fires.
pub async fn serve_admin(
    state: AdminState,
    addr: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Admin API shutting down");
        })
        .await
}
