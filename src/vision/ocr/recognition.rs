// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text line recognition (CTC)

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use super::preprocessing::{REC_INPUT_HEIGHT, REC_MIN_WIDTH};

/// Recognized text for one line crop
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean of the per-character maximum probabilities (0.0-1.0)
    pub confidence: f32,
}

impl RecognizedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Text recognition model (CPU-only ONNX session + character dictionary)
pub struct OcrRecognitionModel {
    session: Session,
    /// Index 0 is the CTC blank
    dictionary: Vec<char>,
    input_name: String,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OcrRecognitionModel {
    /// Load `rec_model.onnx` and its character dictionary
    pub fn new<P: AsRef<Path>>(model_path: P, dict_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        let dictionary = load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

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
                    "Failed to load OCR recognition model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Recognition model input: {}", input_name);

        Ok(Self {
            session,
            dictionary,
            input_name,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize a `[1, 3, 48, W]` tensor from `preprocess_for_recognition`
    pub fn recognize(&mut self, input: &Array4<f32>) -> Result<RecognizedText> {
        let shape = input.shape();
        if shape[0] != 1
            || shape[1] != 3
            || shape[2] != REC_INPUT_HEIGHT as usize
            || shape[3] < REC_MIN_WIDTH as usize
        {
            anyhow::bail!(
                "Invalid input shape: {:?}, expected [1, 3, {}, W>={}]",
                shape,
                REC_INPUT_HEIGHT,
                REC_MIN_WIDTH
            );
        }

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let logits: ArrayD<f32> = {
            let outputs = self
                .session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Recognition inference failed")?;
            let logits = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?
                .to_owned();
            logits
        };

        ctc_greedy_decode(&logits, &self.dictionary)
    }
}

/// Read a PaddleOCR dictionary: one character per line, blank prepended
fn load_dictionary(path: &Path) -> Result<Vec<char>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec!['\0'];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.chars().next() {
            dictionary.push(ch);
        }
    }

    // PaddleOCR models carry a trailing space class
    if !dictionary[1..].contains(&' ') {
        dictionary.push(' ');
    }

    Ok(dictionary)
}

/// Greedy CTC decoding over `[1, T, C]` or `[T, C]` class probabilities
///
/// Takes the best class per timestep, drops blanks (index 0) and collapses
/// repeats. Confidence is the mean probability of the emitted characters.
pub fn ctc_greedy_decode(probabilities: &ArrayD<f32>, dictionary: &[char]) -> Result<RecognizedText> {
    let dims = probabilities.shape();
    let (steps, classes) = match dims.len() {
        3 => (dims[1], dims[2]),
        2 => (dims[0], dims[1]),
        _ => anyhow::bail!("Unexpected recognition output shape: {:?}", dims),
    };

    let prob_at = |t: usize, c: usize| -> f32 {
        if dims.len() == 3 {
            probabilities[IxDyn(&[0, t, c])]
        } else {
            probabilities[IxDyn(&[t, c])]
        }
    };

    let mut text = String::new();
    let mut emitted = Vec::new();
    let mut previous = 0usize;

    for t in 0..steps {
        let (best, best_prob) = (0..classes)
            .map(|c| (c, prob_at(t, c)))
            .fold((0usize, f32::NEG_INFINITY), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

        if best != 0 && best != previous {
            if let Some(&ch) = dictionary.get(best) {
                text.push(ch);
                emitted.push(best_prob);
            }
        }
        previous = best;
    }

    let confidence = if emitted.is_empty() {
        0.0
    } else {
        (emitted.iter().sum::<f32>() / emitted.len() as f32).clamp(0.0, 1.0)
    };

    Ok(RecognizedText {
        text: text.trim().to_string(),
        confidence,
    })
}
