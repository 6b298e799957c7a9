// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image decoding and the in-memory RGB buffer used for cropping

use image::{DynamicImage, ImageFormat, RgbImage};
use thiserror::Error;

use super::box_mapper::PixelRect;
use crate::config::DEFAULT_MAX_IMAGE_BYTES;

/// Custom error types for image decoding
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Decoded RGB image with known pixel dimensions
///
/// Immutable once decoded; crops produce new owned buffers.
#[derive(Debug, Clone)]
pub struct PixelImage {
    buffer: RgbImage,
}

impl PixelImage {
    pub fn from_rgb(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.buffer
    }

    /// Copy into a `DynamicImage` for the preprocessing helpers
    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.buffer.clone())
    }

    /// Extract the end-exclusive region `rect`
    ///
    /// `rect` is expected to come from `to_pixel_rect` for this image's
    /// dimensions; out-of-range parts are clipped by the image crate.
    pub fn crop(&self, rect: &PixelRect) -> PixelImage {
        let region =
            image::imageops::crop_imm(&self.buffer, rect.x1, rect.y1, rect.width(), rect.height())
                .to_image();
        PixelImage { buffer: region }
    }
}

/// Decode raw image bytes with the default size limit
pub fn decode_image_bytes(bytes: &[u8]) -> Result<PixelImage, ImageError> {
    decode_image_bytes_with_limit(bytes, DEFAULT_MAX_IMAGE_BYTES)
}

/// Decode raw image bytes (multipart uploads, downloaded URLs)
///
/// Palette, grayscale and alpha sources are converted to 8-bit RGB.
pub fn decode_image_bytes_with_limit(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<PixelImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge(bytes.len(), max_bytes));
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    Ok(PixelImage::from_rgb(img.to_rgb8()))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
