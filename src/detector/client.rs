// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for the upstream detector

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{DetectorError, ImageUpload, ObjectDetector};
use crate::pipeline::types::{BatchResult, DetectionResult};

/// Multipart field for `/detect`
pub const SINGLE_FIELD: &str = "file";
/// Multipart field for `/detect/batch`, repeated once per image
pub const BATCH_FIELD: &str = "files";

/// Client for the trailer detector's `/detect` endpoints
#[derive(Debug, Clone)]
pub struct DetectorClient {
    client: Client,
    endpoint: String,
    detect_timeout: Duration,
    batch_timeout: Duration,
}

impl DetectorClient {
    pub fn new(endpoint: &str, detect_timeout: Duration, batch_timeout: Duration) -> Result<Self> {
        // Timeouts are set per request; batch calls get the longer one
        let client = Client::builder()
            .build()
            .context("Failed to create detector HTTP client")?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Detector client configured: endpoint={}, timeouts={}s/{}s",
            endpoint,
            detect_timeout.as_secs(),
            batch_timeout.as_secs()
        );

        Ok(Self {
            client,
            endpoint,
            detect_timeout,
            batch_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        confidence_threshold: f64,
        timeout: Duration,
    ) -> Result<T, DetectorError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!("Detector POST {} (threshold {})", url, confidence_threshold);

        let response = self
            .client
            .post(&url)
            .query(&[("confidence_threshold", confidence_threshold)])
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        if status != StatusCode::OK {
            warn!("Detector returned {} for {}: {}", status, path, body);
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| DetectorError::InvalidResponse(e.to_string()))
    }
}

fn to_part(upload: &ImageUpload) -> Result<Part, DetectorError> {
    Part::bytes(upload.bytes.clone())
        .file_name(upload.filename.clone())
        .mime_str(&upload.content_type)
        .map_err(|e| {
            DetectorError::InvalidRequest(format!(
                "bad content type '{}': {}",
                upload.content_type, e
            ))
        })
}

fn classify_transport_error(error: reqwest::Error, timeout: Duration) -> DetectorError {
    if error.is_timeout() {
        DetectorError::Timeout(timeout.as_secs())
    } else if error.is_builder() {
        DetectorError::InvalidRequest(error.to_string())
    } else {
        DetectorError::Unreachable(error.to_string())
    }
}

#[async_trait]
impl ObjectDetector for DetectorClient {
    async fn detect(
        &self,
        upload: &ImageUpload,
        confidence_threshold: f64,
    ) -> Result<DetectionResult, DetectorError> {
        let form = Form::new().part(SINGLE_FIELD, to_part(upload)?);
        self.post_form("/detect", form, confidence_threshold, self.detect_timeout)
            .await
    }

    async fn detect_batch(
        &self,
        uploads: &[ImageUpload],
        confidence_threshold: f64,
    ) -> Result<BatchResult, DetectorError> {
        let mut form = Form::new();
        for upload in uploads {
            form = form.part(BATCH_FIELD, to_part(upload)?);
        }
        self.post_form(
            "/detect/batch",
            form,
            confidence_threshold,
            self.batch_timeout,
        )
        .await
    }
}
