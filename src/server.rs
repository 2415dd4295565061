// src/server.rs

//! Liveness HTTP endpoint.
//!
//! `GET /` answers `200 OK` for external process-health checks. Not part
//! of the watching logic.

use axum::Router;
use axum::routing::get;
use log::info;

use crate::error::Result;

fn app() -> Router {
    Router::new().route("/", get(|| async { "OK" }))
}

/// Bind and serve the liveness endpoint on `port`.
pub async fn serve_liveness(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Liveness endpoint listening on port {port}");
    axum::serve(listener, app()).await?;
    Ok(())
}
