// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection + recognition orchestration
//!
//! Each entry point decodes its input, asks the detector for boxes, then
//! enriches the boxes with recognized text. Recognition is CPU bound and
//! runs on the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::enricher::enrich;
use super::fetcher::{FetchError, ImageSource};
use super::types::{BatchResult, Detection, DetectionResult, UrlRecord};
use crate::detector::{DetectorError, ImageUpload, ObjectDetector};
use crate::vision::ocr::RecognitionEngine;
use crate::vision::{decode_image_bytes_with_limit, ImageError, PixelImage};

/// Decoded images of one batch, keyed by correlation key
///
/// Later inserts replace earlier ones with the same key.
pub type ImageTable = HashMap<String, PixelImage>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    Decode(#[from] ImageError),

    #[error("Failed to download image: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Upstream(#[from] DetectorError),

    /// Nothing usable was left to send to the detector
    #[error("{0}")]
    EmptyBatch(String),

    #[error("No files uploaded")]
    NoFiles,

    #[error("Enrichment worker failed: {0}")]
    Worker(String),
}

/// The enrichment service core, shared by all requests
pub struct EnrichmentPipeline {
    detector: Arc<dyn ObjectDetector>,
    source: Arc<dyn ImageSource>,
    engine: Arc<RecognitionEngine>,
    max_image_bytes: usize,
}

impl EnrichmentPipeline {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        source: Arc<dyn ImageSource>,
        engine: Arc<RecognitionEngine>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            detector,
            source,
            engine,
            max_image_bytes,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<PixelImage, ImageError> {
        decode_image_bytes_with_limit(bytes, self.max_image_bytes)
    }

    /// Detect and enrich one uploaded image
    pub async fn detect_and_enrich(
        &self,
        upload: ImageUpload,
        confidence_threshold: f64,
    ) -> Result<DetectionResult, PipelineError> {
        let image = self.decode(&upload.bytes)?;
        debug!(
            "Decoded {}: {}x{}",
            upload.filename,
            image.width(),
            image.height()
        );

        let result = self.detector.detect(&upload, confidence_threshold).await?;
        self.enrich_single(image, result).await
    }

    /// Download, detect and enrich one image
    ///
    /// A failed download fails the request. The record's `id`, when given,
    /// replaces whatever id the detector reported.
    pub async fn detect_and_enrich_url(
        &self,
        record: UrlRecord,
        confidence_threshold: f64,
    ) -> Result<DetectionResult, PipelineError> {
        info!("Processing URL: {}", record.image_url);

        let bytes = self.source.fetch(&record.image_url).await?;
        let image = self.decode(&bytes)?;
        let upload = ImageUpload::new(record.correlation_key(), None, bytes);

        let mut result = self.detector.detect(&upload, confidence_threshold).await?;
        if let Some(id) = record.caller_id() {
            result.id = Some(id.to_string());
        }

        self.enrich_single(image, result).await
    }

    /// Detect and enrich several uploaded images with one detector call
    ///
    /// Files that fail to decode are dropped. The reported total time covers
    /// the whole call, including recognition.
    pub async fn detect_and_enrich_batch(
        &self,
        uploads: Vec<ImageUpload>,
        confidence_threshold: f64,
    ) -> Result<BatchResult, PipelineError> {
        let started = Instant::now();

        if uploads.is_empty() {
            return Err(PipelineError::NoFiles);
        }

        let mut images = ImageTable::new();
        let mut staged = Vec::with_capacity(uploads.len());

        for upload in uploads {
            match self.decode(&upload.bytes) {
                Ok(image) => {
                    register(&mut images, upload.filename.clone(), image);
                    staged.push(upload);
                }
                Err(e) => warn!("Dropping upload {}: {}", upload.filename, e),
            }
        }

        if staged.is_empty() {
            return Err(PipelineError::EmptyBatch(
                "No valid images could be decoded".to_string(),
            ));
        }

        self.run_batch(staged, images, confidence_threshold, started)
            .await
    }

    /// Download, detect and enrich several images
    ///
    /// Downloads run one at a time in input order. A record that cannot be
    /// downloaded or decoded is logged and dropped.
    pub async fn detect_and_enrich_url_batch(
        &self,
        records: Vec<UrlRecord>,
        confidence_threshold: f64,
    ) -> Result<BatchResult, PipelineError> {
        let started = Instant::now();

        if records.is_empty() {
            return Err(PipelineError::EmptyBatch("No images provided".to_string()));
        }

        let mut images = ImageTable::new();
        let mut staged = Vec::with_capacity(records.len());

        for record in &records {
            let bytes = match self.source.fetch(&record.image_url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("Failed to download {}: {}", record.image_url, e);
                    continue;
                }
            };
            let image = match self.decode(&bytes) {
                Ok(image) => image,
                Err(e) => {
                    error!("Failed to decode {}: {}", record.image_url, e);
                    continue;
                }
            };

            let key = record.correlation_key();
            register(&mut images, key.clone(), image);
            staged.push(ImageUpload::new(key, None, bytes));
        }

        if staged.is_empty() {
            return Err(PipelineError::EmptyBatch(
                "No valid images could be downloaded".to_string(),
            ));
        }

        info!(
            "Downloaded {} of {} images for batch",
            staged.len(),
            records.len()
        );

        self.run_batch(staged, images, confidence_threshold, started)
            .await
    }

    /// Read the whole image without calling the detector
    pub async fn recognize_only(&self, upload: ImageUpload) -> Result<Detection, PipelineError> {
        let image = self.decode(&upload.bytes)?;
        let engine = self.engine.clone();

        let recognition = tokio::task::spawn_blocking(move || engine.recognize(&image))
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))?;

        Ok(Detection::recognition_only(recognition))
    }

    async fn enrich_single(
        &self,
        image: PixelImage,
        mut result: DetectionResult,
    ) -> Result<DetectionResult, PipelineError> {
        if !result.has_detections() {
            debug!(
                "Nothing to enrich for {} (success={})",
                result.image_metadata.filename, result.success
            );
            return Ok(result);
        }

        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || {
            let label = result.image_metadata.filename.clone();
            let summary = enrich(&engine, &image, &mut result.detections, &label);
            debug!("{}: {:?}", label, summary);
            result
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))
    }

    async fn run_batch(
        &self,
        staged: Vec<ImageUpload>,
        images: ImageTable,
        confidence_threshold: f64,
        started: Instant,
    ) -> Result<BatchResult, PipelineError> {
        let mut batch = self
            .detector
            .detect_batch(&staged, confidence_threshold)
            .await?;
        drop(staged);

        let engine = self.engine.clone();
        let mut batch = tokio::task::spawn_blocking(move || {
            enrich_batch(&engine, &images, &mut batch.results);
            batch
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))?;

        batch.total_processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Batch complete: {} results, {} detections, {:.1}ms",
            batch.results.len(),
            batch.total_detections,
            batch.total_processing_time_ms
        );

        Ok(batch)
    }
}

impl std::fmt::Debug for EnrichmentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentPipeline")
            .field("max_image_bytes", &self.max_image_bytes)
            .finish_non_exhaustive()
    }
}

fn register(images: &mut ImageTable, key: String, image: PixelImage) {
    if images.insert(key.clone(), image).is_some() {
        warn!("Duplicate image key '{}', keeping the later image", key);
    }
}

/// Enrich every batch result whose filename has a local image
///
/// Results without a match are left as the detector returned them.
pub fn enrich_batch(engine: &RecognitionEngine, images: &ImageTable, results: &mut [DetectionResult]) {
    for result in results.iter_mut() {
        let filename = result.image_metadata.filename.clone();
        let Some(image) = images.get(&filename) else {
            warn!("No local image for detector result '{}'", filename);
            continue;
        };
        if result.detections.is_empty() {
            continue;
        }
        enrich(engine, image, &mut result.detections, &filename);
    }
}
