// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every setting can be passed as a command-line flag or through the
//! environment (a `.env` file is honoured by `main`).

use clap::Parser;
use std::time::Duration;
use url::Url;

/// Default upper bound for a single image payload (20MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Default upper bound for a whole request body (200MB, batch uploads)
pub const DEFAULT_MAX_BODY_BYTES: usize = 200 * 1024 * 1024;

/// Runtime configuration for the enrichment service
#[derive(Debug, Clone, Parser)]
#[command(name = "trailer-ocr", about = "Detection + OCR enrichment service")]
pub struct ServiceConfig {
    /// Base URL of the upstream object detector
    #[arg(long, env = "DETECTOR_URL", default_value = "http://trailer-detector:8000")]
    pub detector_url: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: String,

    /// Directory holding det_model.onnx, rec_model.onnx and ppocr_keys_v1.txt
    #[arg(long, env = "OCR_MODEL_DIR", default_value = "./models/paddleocr-onnx")]
    pub ocr_model_dir: String,

    /// Intra-op threads for each ONNX session
    #[arg(long, env = "OCR_THREADS", default_value_t = 4)]
    pub ocr_threads: usize,

    /// Timeout for a single-image detector call, in seconds
    #[arg(long, env = "DETECT_TIMEOUT_SECS", default_value_t = 120)]
    pub detect_timeout_secs: u64,

    /// Timeout for a batch detector call, in seconds
    #[arg(long, env = "BATCH_DETECT_TIMEOUT_SECS", default_value_t = 300)]
    pub batch_detect_timeout_secs: u64,

    /// Timeout for each image download in URL modes, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Largest accepted image payload in bytes
    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = DEFAULT_MAX_IMAGE_BYTES)]
    pub max_image_bytes: usize,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    pub fn detect_timeout(&self) -> Duration {
        Duration::from_secs(self.detect_timeout_secs)
    }

    pub fn batch_detect_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_detect_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let detector = Url::parse(&self.detector_url)
            .map_err(|e| format!("detector_url is not a valid URL: {}", e))?;
        if detector.scheme() != "http" && detector.scheme() != "https" {
            return Err(format!(
                "detector_url must use http or https, got '{}'",
                detector.scheme()
            ));
        }
        if self.detect_timeout_secs == 0 {
            return Err("detect_timeout_secs must be at least 1".to_string());
        }
        if self.batch_detect_timeout_secs == 0 {
            return Err("batch_detect_timeout_secs must be at least 1".to_string());
        }
        if self.fetch_timeout_secs == 0 {
            return Err("fetch_timeout_secs must be at least 1".to_string());
        }
        if self.ocr_threads == 0 {
            return Err("ocr_threads must be at least 1".to_string());
        }
        if self.max_image_bytes == 0 {
            return Err("max_image_bytes must be greater than 0".to_string());
        }
        if self.max_body_bytes < self.max_image_bytes {
            return Err("max_body_bytes must not be smaller than max_image_bytes".to_string());
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            detector_url: "http://trailer-detector:8000".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            ocr_model_dir: "./models/paddleocr-onnx".to_string(),
            ocr_threads: 4,
            detect_timeout_secs: 120,
            batch_detect_timeout_secs: 300,
            fetch_timeout_secs: 30,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
