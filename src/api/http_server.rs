// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::detect::{
    detect_and_ocr_batch_handler, detect_and_ocr_handler, detect_and_ocr_url_batch_handler,
    detect_and_ocr_url_handler,
};
use super::handlers::health_handler;
use super::ocr::ocr_handler;
use crate::pipeline::EnrichmentPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EnrichmentPipeline>,
}

impl AppState {
    pub fn new(pipeline: EnrichmentPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Detection + OCR
        .route("/detect-and-ocr", post(detect_and_ocr_handler))
        .route("/detect-and-ocr/batch", post(detect_and_ocr_batch_handler))
        .route("/detect-and-ocr/url", post(detect_and_ocr_url_handler))
        .route(
            "/detect-and-ocr/url/batch",
            post(detect_and_ocr_url_batch_handler),
        )
        // Recognition only
        .route("/ocr", post(ocr_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(
    state: AppState,
    listen_addr: &str,
    max_body_bytes: usize,
) -> anyhow::Result<()> {
    let app = build_router(state, max_body_bytes);

    let addr = listen_addr.parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
