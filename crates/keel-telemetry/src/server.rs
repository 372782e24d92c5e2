//! HTTP endpoint exposing the prometheus registry.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use tracing::info;

use crate::error::TelemetryResult;

/// Serve `GET /metrics` until the process exits.
///
/// Runs as its own tokio task; the engine never blocks on scrapes.
pub async fn serve_metrics(listen: SocketAddr) -> TelemetryResult<()> {
    let app = Router::new().route("/metrics", get(render_metrics));
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(%listen, "metrics endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_metrics() -> Result<String, (StatusCode, String)> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
