// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upstream object detector
//!
//! The detector is an external HTTP service that finds trailer regions and
//! returns them as normalized boxes. This module owns its contract.

pub mod client;

pub use client::DetectorClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::pipeline::types::{BatchResult, DetectionResult};

/// Content type used when the original upload did not carry one
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Detector call failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectorError {
    /// Detector answered with a non-200 status
    #[error("Detector failed: {body}")]
    Status { status: u16, body: String },

    #[error("Detector unreachable: {0}")]
    Unreachable(String),

    #[error("Detector timed out after {0}s")]
    Timeout(u64),

    /// Body could not be parsed as a detection result
    #[error("Invalid detector response: {0}")]
    InvalidResponse(String),

    /// The request could not be built (bad content type, bad URL)
    #[error("Invalid detector request: {0}")]
    InvalidRequest(String),
}

/// One image forwarded to the detector as a multipart part
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            bytes,
        }
    }
}

/// Finds objects in images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in one image (`POST /detect`)
    async fn detect(
        &self,
        upload: &ImageUpload,
        confidence_threshold: f64,
    ) -> Result<DetectionResult, DetectorError>;

    /// Detect objects in several images with a single call (`POST /detect/batch`)
    async fn detect_batch(
        &self,
        uploads: &[ImageUpload],
        confidence_threshold: f64,
    ) -> Result<BatchResult, DetectorError>;
}
