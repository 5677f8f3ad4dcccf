//! Liveness endpoint.
//!
//! Hosting platforms probe the service over HTTP; every path and method
//! answers 200 while the process is up.

use std::net::SocketAddr;

use axum::{http::StatusCode, response::IntoResponse, Router};
use tokio::net::TcpListener;

pub const LIVENESS_TEXT: &str = "🚀 Bot is running!";

pub fn router() -> Router {
    Router::new().fallback(liveness_handler)
}

/// Start the liveness server on `0.0.0.0:{port}`.
pub async fn start_web_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting liveness server on http://{}", addr);
    serve(listener).await
}

/// Serve the liveness router on an already bound listener.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_TEXT)
}
