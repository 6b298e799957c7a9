// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, sync::Arc};
use tracing::info;
use trailer_ocr::{
    api::{start_server, AppState},
    config::ServiceConfig,
    detector::DetectorClient,
    pipeline::{EnrichmentPipeline, HttpImageFetcher},
    version,
    vision::ocr::{PaddleOcrModel, RecognitionEngine},
};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Trailer OCR service...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!("🧩 Features: {}", version::FEATURES.join(", "));
    println!();
    info!("{}", version::get_version_string());

    let config = ServiceConfig::parse();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    println!("🔎 Detector: {}", config.detector_url);
    println!("📂 OCR models: {}", config.ocr_model_dir);

    // The service is useless without OCR, so a load failure is fatal
    println!("🧠 Initializing OCR engine...");
    let model = PaddleOcrModel::new(&config.ocr_model_dir, config.ocr_threads)
        .await
        .context("Failed to initialize OCR engine")?;
    let engine = Arc::new(RecognitionEngine::new(model));
    println!("✅ OCR engine initialized");

    let detector = DetectorClient::new(
        &config.detector_url,
        config.detect_timeout(),
        config.batch_detect_timeout(),
    )?;
    let fetcher = HttpImageFetcher::new(config.fetch_timeout())?;

    let pipeline = EnrichmentPipeline::new(
        Arc::new(detector),
        Arc::new(fetcher),
        engine,
        config.max_image_bytes,
    );

    println!("🌐 Listening on {}", config.listen_addr);
    start_server(
        AppState::new(pipeline),
        &config.listen_addr,
        config.max_body_bytes,
    )
    .await?;

    println!("👋 Trailer OCR service stopped");
    Ok(())
}
