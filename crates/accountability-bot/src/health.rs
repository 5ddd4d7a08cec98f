//! Health check HTTP endpoint for hosting platforms.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

const HEALTH_BODY: &str = "Bot is running!";

/// Health check endpoint.
pub async fn health() -> &'static str {
    HEALTH_BODY
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}

/// Serve the health routes on an already bound listener.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

/// Bind `addr` and serve until the process exits.
pub async fn bind_and_serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Health server listening");
    serve(listener).await
}
