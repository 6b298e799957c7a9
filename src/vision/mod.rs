// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for detection enrichment
//!
//! This module provides:
//! - Image decoding into RGB pixel buffers
//! - Normalized box to pixel rectangle mapping
//! - OCR (text recognition) via PaddleOCR, CPU only

pub mod box_mapper;
pub mod image_utils;
pub mod ocr;

pub use box_mapper::{to_pixel_rect, PixelRect};
pub use image_utils::{decode_image_bytes, decode_image_bytes_with_limit, detect_format, ImageError, PixelImage};
