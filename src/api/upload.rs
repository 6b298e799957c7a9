// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart image upload extraction

use axum_extra::extract::Multipart;
use tracing::debug;

use super::errors::ApiError;
use crate::detector::ImageUpload;

/// Field name for single-image endpoints
pub const FILE_FIELD: &str = "file";
/// Field name for multi-image endpoints
pub const FILES_FIELD: &str = "files";

/// Collect every part named `field` as an image upload, in arrival order
///
/// Other fields are ignored. Parts without a file name get a positional one.
pub async fn read_uploads(
    multipart: &mut Multipart,
    field: &str,
) -> Result<Vec<ImageUpload>, ApiError> {
    let mut uploads = Vec::new();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if part.name() != Some(field) {
            debug!("Ignoring multipart field {:?}", part.name());
            continue;
        }

        let filename = part
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}", uploads.len()));
        let content_type = part.content_type().map(str::to_string);
        let bytes = part.bytes().await.map_err(|e| {
            ApiError::InvalidRequest(format!("Failed to read upload '{}': {}", filename, e))
        })?;

        debug!("Received upload {} ({} bytes)", filename, bytes.len());
        uploads.push(ImageUpload::new(filename, content_type, bytes.to_vec()));
    }

    Ok(uploads)
}

/// Read exactly one upload from `field`; extra parts are ignored
pub async fn read_single_upload(
    multipart: &mut Multipart,
    field: &str,
) -> Result<ImageUpload, ApiError> {
    read_uploads(multipart, field)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::ValidationError {
            field: field.to_string(),
            message: format!("multipart field '{}' is required", field),
        })
}
