// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics and the HTTP endpoint serving them.
//!
//! - `vault_request_duration_seconds{object_type, action, outcome}` - latency of Vault calls
//! - `/healthz` - liveness endpoint

use crate::events::CallOutcome;
use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info};

static REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vault_request_duration_seconds",
            "Duration of requests against Vault in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["object_type", "action", "outcome"],
    )
    .expect("Failed to create REQUEST_DURATION metric - this should never happen")
});

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::new();
    registry
        .register(Box::new(REQUEST_DURATION.clone()))
        .expect("Failed to register REQUEST_DURATION metric - this should never happen");
    registry
});

pub fn observe_request(
    object_type: &str,
    action: &str,
    outcome: CallOutcome,
    duration: Duration,
) {
    REQUEST_DURATION
        .with_label_values(&[object_type, action, outcome.as_str()])
        .observe(duration.as_secs_f64());
}

/// Current metrics in the Prometheus text format
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics are not valid UTF-8")
}

pub fn router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
}

pub async fn serve(addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics server to {}", addr))?;
    info!("Metrics server listening on {}", addr);
    axum::serve(listener, router())
        .await
        .context("Metrics server failed")
}

async fn metrics_handler() -> impl IntoResponse {
    match render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => {
            error!("Failed to render metrics: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to render metrics: {:#}", e),
            )
        }
    }
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}
