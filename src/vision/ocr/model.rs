// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR pipeline: line detection followed by per-line recognition

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use super::detection::{OcrDetectionModel, TextBox};
use super::engine::{TextLine, TextRecognizer};
use super::preprocessing::{
    preprocess_for_detection, preprocess_for_recognition, PreprocessInfo, OCR_INPUT_SIZE,
};
use super::recognition::OcrRecognitionModel;
use crate::vision::{PixelImage, PixelRect};

/// Detection model file name inside the model directory
pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";
/// Recognition model file name inside the model directory
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";
/// Character dictionary file name inside the model directory
pub const DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// PaddleOCR models for text extraction (CPU only)
#[derive(Debug)]
pub struct PaddleOcrModel {
    detector: OcrDetectionModel,
    recognizer: OcrRecognitionModel,
}

impl PaddleOcrModel {
    /// Load both models and the dictionary from `model_dir`
    ///
    /// Expected files:
    /// - det_model.onnx (text detection)
    /// - rec_model.onnx (text recognition)
    /// - ppocr_keys_v1.txt (character dictionary)
    pub async fn new(model_dir: &str, intra_threads: usize) -> Result<Self> {
        let dir = Path::new(model_dir).to_path_buf();
        info!("Loading PaddleOCR models from {}", dir.display());

        // Session construction is blocking and slow
        let (detector, recognizer) = tokio::task::spawn_blocking(move || -> Result<_> {
            let detector =
                OcrDetectionModel::new(dir.join(DETECTION_MODEL_FILE), intra_threads)?;
            let recognizer = OcrRecognitionModel::new(
                dir.join(RECOGNITION_MODEL_FILE),
                dir.join(DICTIONARY_FILE),
                intra_threads,
            )?;
            Ok((detector, recognizer))
        })
        .await
        .context("OCR model loading task failed")??;

        info!(
            "✅ PaddleOCR models loaded ({} dictionary entries)",
            recognizer.dictionary_size()
        );

        Ok(Self {
            detector,
            recognizer,
        })
    }

    /// Find text lines in `image` and read each one
    pub fn read_text_lines(&mut self, image: &PixelImage) -> Result<Vec<TextLine>> {
        let dynamic = image.to_dynamic();
        let letterbox = PreprocessInfo::new(&dynamic, OCR_INPUT_SIZE);

        let boxes = self.detector.detect(&preprocess_for_detection(&dynamic))?;

        let mut lines = Vec::new();
        for text_box in boxes.iter().filter(|b| b.is_valid()) {
            let Some(rect) = map_text_box(&letterbox, text_box) else {
                continue;
            };

            let crop = image.crop(&rect).to_dynamic();
            let recognized = self
                .recognizer
                .recognize(&preprocess_for_recognition(&crop))?;

            if recognized.is_empty() {
                continue;
            }
            lines.push(TextLine::new(recognized.text, f64::from(recognized.confidence)));
        }

        debug!("Read {} of {} detected text lines", lines.len(), boxes.len());
        Ok(lines)
    }
}

impl TextRecognizer for PaddleOcrModel {
    fn read_lines(&mut self, image: &PixelImage) -> Result<Vec<TextLine>> {
        self.read_text_lines(image)
    }
}

/// Map a letterboxed text box back onto the source image
///
/// The box is widened outward to whole pixels and clamped to the image.
pub fn map_text_box(letterbox: &PreprocessInfo, text_box: &TextBox) -> Option<PixelRect> {
    let (left, top) = letterbox.map_to_original(text_box.x, text_box.y);
    let (right, bottom) =
        letterbox.map_to_original(text_box.x + text_box.width, text_box.y + text_box.height);

    let x1 = left.floor().max(0.0) as u32;
    let y1 = top.floor().max(0.0) as u32;
    let x2 = (right.ceil().max(0.0) as u32).min(letterbox.original_width);
    let y2 = (bottom.ceil().max(0.0) as u32).min(letterbox.original_height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(PixelRect { x1, y1, x2, y2 })
}
