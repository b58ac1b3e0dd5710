//! Public HTTP surface: the per-order wait-time endpoint and a health check.

pub mod handlers;
pub mod token;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::estimation::WaitEstimator;
use crate::order::repository::OrderRepository;
use crate::http::token::OrderTokenVerifier;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn OrderRepository>,
    pub estimator: Arc<WaitEstimator>,
    pub tokens: Arc<dyn OrderTokenVerifier>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/public/orders/{order_number}/wait-time",
            get(handlers::wait_time),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "wait-time API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("wait-time API stopped");
    Ok(())
}
