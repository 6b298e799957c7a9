// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text line detection
//!
//! Runs the DB detection model and turns its probability map into
//! axis-aligned text boxes.

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use tracing::{debug, info};

/// Default probability threshold for text pixels
pub const DEFAULT_TEXT_THRESHOLD: f32 = 0.3;

/// Connected regions smaller than this (in map pixels) are noise
pub const MIN_REGION_PIXELS: usize = 10;

/// A detected text box, in letterboxed (640x640) coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean probability over the region's pixels
    pub confidence: f32,
}

impl TextBox {
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.confidence > 0.0
    }
}

/// Text detection model (CPU-only ONNX session)
pub struct OcrDetectionModel {
    session: Session,
    input_name: String,
    text_threshold: f32,
}

impl std::fmt::Debug for OcrDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrDetectionModel")
            .field("input_name", &self.input_name)
            .field("text_threshold", &self.text_threshold)
            .finish_non_exhaustive()
    }
}

impl OcrDetectionModel {
    /// Load `det_model.onnx`
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects it.
    pub fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!("Loading OCR detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR detection model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Detection model input: {}", input_name);

        Ok(Self {
            session,
            input_name,
            text_threshold: DEFAULT_TEXT_THRESHOLD,
        })
    }

    /// Detect text boxes in a `[1, 3, H, W]` tensor from `preprocess_for_detection`
    pub fn detect(&mut self, input: &Array4<f32>) -> Result<Vec<TextBox>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        let (input_height, input_width) = (shape[2], shape[3]);

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let probability_map: ArrayD<f32> = {
            let outputs = self
                .session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Detection inference failed")?;
            let map = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?
                .to_owned();
            map
        };

        let boxes = extract_text_boxes(
            &probability_map,
            input_height,
            input_width,
            self.text_threshold,
        )?;
        debug!("Detected {} text regions", boxes.len());

        Ok(boxes)
    }
}

/// Convert a `[1, 1, H, W]` or `[1, H, W]` probability map into text boxes
///
/// Pixels at or above `threshold` are grouped into 4-connected regions;
/// regions are scaled back to the input tensor's size and sorted
/// top-to-bottom, then left-to-right.
pub fn extract_text_boxes(
    probability_map: &ArrayD<f32>,
    input_height: usize,
    input_width: usize,
    threshold: f32,
) -> Result<Vec<TextBox>> {
    let dims = probability_map.shape();
    let (map_height, map_width) = match dims.len() {
        4 => (dims[2], dims[3]),
        3 => (dims[1], dims[2]),
        _ => anyhow::bail!("Unexpected detection output shape: {:?}", dims),
    };
    if map_height == 0 || map_width == 0 {
        return Ok(Vec::new());
    }

    let prob_at = |x: usize, y: usize| -> f32 {
        if dims.len() == 4 {
            probability_map[IxDyn(&[0, 0, y, x])]
        } else {
            probability_map[IxDyn(&[0, y, x])]
        }
    };

    let scale_x = input_width as f32 / map_width as f32;
    let scale_y = input_height as f32 / map_height as f32;

    let mut visited = vec![false; map_width * map_height];
    let mut boxes = Vec::new();

    for start_y in 0..map_height {
        for start_x in 0..map_width {
            if visited[start_y * map_width + start_x] || prob_at(start_x, start_y) < threshold {
                continue;
            }

            let mut stack = vec![(start_x, start_y)];
            let (mut min_x, mut max_x, mut min_y, mut max_y) = (start_x, start_x, start_y, start_y);
            let mut count = 0usize;
            let mut sum = 0.0f32;

            while let Some((x, y)) = stack.pop() {
                let idx = y * map_width + x;
                if visited[idx] {
                    continue;
                }
                let prob = prob_at(x, y);
                if prob < threshold {
                    continue;
                }
                visited[idx] = true;
                count += 1;
                sum += prob;

                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                if x > 0 {
                    stack.push((x - 1, y));
                }
                if x + 1 < map_width {
                    stack.push((x + 1, y));
                }
                if y > 0 {
                    stack.push((x, y - 1));
                }
                if y + 1 < map_height {
                    stack.push((x, y + 1));
                }
            }

            if count >= MIN_REGION_PIXELS {
                boxes.push(TextBox {
                    x: min_x as f32 * scale_x,
                    y: min_y as f32 * scale_y,
                    width: (max_x - min_x + 1) as f32 * scale_x,
                    height: (max_y - min_y + 1) as f32 * scale_y,
                    confidence: sum / count as f32,
                });
            }
        }
    }

    boxes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    Ok(boxes)
}
