// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition for detection crops
//!
//! Components:
//! - `engine` - Shared engine over a pluggable recognizer, result aggregation
//! - `model` - PaddleOCR pipeline (detection + recognition) as a recognizer
//! - `detection` - Text line detection (DB probability map)
//! - `recognition` - Text line recognition (CTC)
//! - `preprocessing` - Image to tensor conversion

pub mod detection;
pub mod engine;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use detection::{OcrDetectionModel, TextBox};
pub use engine::{aggregate_lines, Recognition, RecognitionEngine, TextLine, TextRecognizer};
pub use model::PaddleOcrModel;
pub use recognition::{OcrRecognitionModel, RecognizedText};
