// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint handler

use axum::extract::State;
use axum::Json;
use axum_extra::extract::Multipart;
use tracing::info;

use crate::api::errors::ApiErrorResponse;
use crate::api::http_server::AppState;
use crate::api::upload::{read_single_upload, FILE_FIELD};
use crate::pipeline::Detection;

/// POST /ocr - Read text from a whole image, no detection
///
/// # Request
/// - multipart field `file`: the image
///
/// # Response
/// A single detection with `class_id` -1, `class_name` "recognition_only",
/// a full-frame bbox and `text`/`ocr_confidence` when anything was read.
pub async fn ocr_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Detection>, ApiErrorResponse> {
    let upload = read_single_upload(&mut multipart, FILE_FIELD).await?;
    let filename = upload.filename.clone();

    let detection = state.pipeline.recognize_only(upload).await?;
    info!(
        "OCR {}: {:?} ({:?})",
        filename, detection.text, detection.recognition_confidence
    );

    Ok(Json(detection))
}
