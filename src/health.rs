// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP endpoints for Kubernetes probes and Prometheus scraping.
//!
//! - `/healthz` - Liveness probe, `200 ok` while the process serves requests
//! - `/metrics` - Prometheus text exposition of [`crate::metrics::METRICS_REGISTRY`]

use crate::constants::{HEALTH_SERVER_PATH, METRICS_SERVER_PATH};
use crate::metrics::gather_metrics;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tracing::{error, info};

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

/// Routes served by the health server.
pub fn router() -> Router {
    Router::new()
        .route(HEALTH_SERVER_PATH, get(healthz))
        .route(METRICS_SERVER_PATH, get(metrics_handler))
}

/// Serve [`router`] on `addr` until the listener fails.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server stops.
pub async fn run_health_server(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health server listening on {}", addr);
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
