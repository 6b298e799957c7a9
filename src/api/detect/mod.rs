// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect-and-OCR endpoints (upload and URL, single and batch)

pub mod handler;
pub mod request;

pub use handler::{
    detect_and_ocr_batch_handler, detect_and_ocr_handler, detect_and_ocr_url_batch_handler,
    detect_and_ocr_url_handler,
};
pub use request::{ThresholdQuery, UrlBatchDetectionRequest, UrlDetectionRequest};
