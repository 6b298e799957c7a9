// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect-and-OCR endpoint handlers

use axum::extract::{rejection::JsonRejection, Query, State};
use axum::Json;
use axum_extra::extract::Multipart;
use tracing::{debug, info};

use super::request::{ThresholdQuery, UrlBatchDetectionRequest, UrlDetectionRequest};
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::api::upload::{read_single_upload, read_uploads, FILES_FIELD, FILE_FIELD};
use crate::pipeline::{BatchResult, DetectionResult};

/// POST /detect-and-ocr - Detect trailers in one uploaded image and read their IDs
///
/// # Request
/// - multipart field `file`: the image
/// - query `confidence_threshold`: 0.0-1.0, forwarded to the detector
///
/// # Errors
/// - 400: invalid image, missing file, threshold out of range
/// - detector's status: detector rejected the image
/// - 502/504: detector unreachable or timed out
pub async fn detect_and_ocr_handler(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
    mut multipart: Multipart,
) -> Result<Json<DetectionResult>, ApiErrorResponse> {
    query.validate()?;
    let upload = read_single_upload(&mut multipart, FILE_FIELD).await?;
    debug!(
        "detect-and-ocr: {} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let result = state
        .pipeline
        .detect_and_enrich(upload, query.confidence_threshold)
        .await?;

    Ok(Json(result))
}

/// POST /detect-and-ocr/batch - Detect and read IDs in several uploaded images
///
/// Multipart field `files` may repeat. Undecodable files are dropped; the
/// call fails only when none are usable.
pub async fn detect_and_ocr_batch_handler(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
    mut multipart: Multipart,
) -> Result<Json<BatchResult>, ApiErrorResponse> {
    query.validate()?;
    let uploads = read_uploads(&mut multipart, FILES_FIELD).await?;
    info!("detect-and-ocr batch: {} files", uploads.len());

    let result = state
        .pipeline
        .detect_and_enrich_batch(uploads, query.confidence_threshold)
        .await?;

    Ok(Json(result))
}

/// POST /detect-and-ocr/url - Download one image, then detect and read IDs
pub async fn detect_and_ocr_url_handler(
    State(state): State<AppState>,
    payload: Result<Json<UrlDetectionRequest>, JsonRejection>,
) -> Result<Json<DetectionResult>, ApiErrorResponse> {
    let Json(request) = payload.map_err(ApiError::from)?;
    request.validate()?;
    let (record, threshold) = request.into_record();

    let result = state
        .pipeline
        .detect_and_enrich_url(record, threshold)
        .await?;

    Ok(Json(result))
}

/// POST /detect-and-ocr/url/batch - Download several images, then detect and read IDs
///
/// Downloads that fail are skipped; see `EnrichmentPipeline::detect_and_enrich_url_batch`.
pub async fn detect_and_ocr_url_batch_handler(
    State(state): State<AppState>,
    payload: Result<Json<UrlBatchDetectionRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiErrorResponse> {
    let Json(request) = payload.map_err(ApiError::from)?;
    request.validate()?;
    info!("detect-and-ocr url batch: {} images", request.images.len());

    let result = state
        .pipeline
        .detect_and_enrich_url_batch(request.images, request.confidence_threshold)
        .await?;

    Ok(Json(result))
}
