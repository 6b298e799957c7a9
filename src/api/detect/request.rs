// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect-and-OCR request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::pipeline::UrlRecord;

fn check_threshold(threshold: f64) -> Result<(), ApiError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ApiError::ValidationError {
            field: "confidence_threshold".to_string(),
            message: format!(
                "confidence_threshold must be between 0.0 and 1.0, got {}",
                threshold
            ),
        });
    }
    Ok(())
}

fn check_url(field: &str, url: &str) -> Result<(), ApiError> {
    if url.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: field.to_string(),
            message: "image_url is required".to_string(),
        });
    }
    Ok(())
}

/// `?confidence_threshold=` on the upload endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdQuery {
    #[serde(default)]
    pub confidence_threshold: f64,
}

impl ThresholdQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_threshold(self.confidence_threshold)
    }
}

/// Body of `POST /detect-and-ocr/url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlDetectionRequest {
    pub image_url: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub confidence_threshold: f64,
}

impl UrlDetectionRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_url("image_url", &self.image_url)?;
        check_threshold(self.confidence_threshold)
    }

    pub fn into_record(self) -> (UrlRecord, f64) {
        (
            UrlRecord::new(self.image_url, self.id),
            self.confidence_threshold,
        )
    }
}

/// Body of `POST /detect-and-ocr/url/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlBatchDetectionRequest {
    #[serde(default)]
    pub images: Vec<UrlRecord>,
    #[serde(default)]
    pub confidence_threshold: f64,
}

impl UrlBatchDetectionRequest {
    /// An empty `images` list is left to the pipeline, which reports it as
    /// an empty batch.
    pub fn validate(&self) -> Result<(), ApiError> {
        for (index, record) in self.images.iter().enumerate() {
            check_url(&format!("images[{}].image_url", index), &record.image_url)?;
        }
        check_threshold(self.confidence_threshold)
    }
}
