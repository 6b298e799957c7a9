// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide text recognition engine
//!
//! Wraps a [`TextRecognizer`] capability, serializes access to it and folds
//! its per-line output into a single [`Recognition`].

use std::sync::Mutex;
use tracing::{debug, warn};

use crate::vision::PixelImage;

/// One line of text read by a recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: f64,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Outcome of recognizing one region
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Recognized { text: String, confidence: f64 },
    NoText,
}

/// A text reading capability (an OCR model, or a test double)
///
/// Implementations may keep mutable inference state; the engine never calls
/// them concurrently.
pub trait TextRecognizer: Send {
    /// Read every text line in `image`, in reading order
    fn read_lines(&mut self, image: &PixelImage) -> anyhow::Result<Vec<TextLine>>;
}

/// Join lines with single spaces and average their confidences
///
/// Blank lines are ignored; no remaining lines means `NoText`.
pub fn aggregate_lines(lines: &[TextLine]) -> Recognition {
    let kept: Vec<&TextLine> = lines
        .iter()
        .filter(|line| !line.text.trim().is_empty())
        .collect();

    if kept.is_empty() {
        return Recognition::NoText;
    }

    let text = kept
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let confidence = kept.iter().map(|line| line.confidence).sum::<f64>() / kept.len() as f64;

    Recognition::Recognized { text, confidence }
}

/// Shared recognition engine, constructed once at startup
pub struct RecognitionEngine {
    recognizer: Mutex<Box<dyn TextRecognizer>>,
}

impl RecognitionEngine {
    pub fn new<R: TextRecognizer + 'static>(recognizer: R) -> Self {
        Self {
            recognizer: Mutex::new(Box::new(recognizer)),
        }
    }

    /// Recognize the text in `region`
    ///
    /// Capability failures are logged and reported as `NoText` so one bad
    /// crop cannot fail its siblings.
    pub fn recognize(&self, region: &PixelImage) -> Recognition {
        let mut recognizer = match self.recognizer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Recognizer lock was poisoned, continuing with inner state");
                poisoned.into_inner()
            }
        };

        match recognizer.read_lines(region) {
            Ok(lines) => {
                let recognition = aggregate_lines(&lines);
                if let Recognition::Recognized { text, confidence } = &recognition {
                    debug!("Recognized '{}' ({:.2}) from {} lines", text, confidence, lines.len());
                }
                recognition
            }
            Err(e) => {
                warn!(
                    "Text recognition failed on {}x{} region: {:#}",
                    region.width(),
                    region.height(),
                    e
                );
                Recognition::NoText
            }
        }
    }
}

impl std::fmt::Debug for RecognitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionEngine").finish_non_exhaustive()
    }
}
