// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod detector;
pub mod pipeline;
pub mod version;
pub mod vision;

pub use config::ServiceConfig;
pub use detector::{DetectorClient, DetectorError, ImageUpload, ObjectDetector};
pub use pipeline::{
    BatchResult, Detection, DetectionResult, EnrichmentPipeline, HttpImageFetcher, ImageSource,
    NormalizedBox, PipelineError, UrlRecord,
};
pub use vision::ocr::{PaddleOcrModel, Recognition, RecognitionEngine, TextLine, TextRecognizer};
