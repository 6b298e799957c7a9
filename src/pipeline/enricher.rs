// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Attach recognized text to detections

use tracing::{debug, info, warn};

use super::types::Detection;
use crate::vision::ocr::{Recognition, RecognitionEngine};
use crate::vision::{to_pixel_rect, PixelImage};

/// Counts from one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub recognized: usize,
    pub no_text: usize,
    pub skipped: usize,
}

impl EnrichmentSummary {
    pub fn total(&self) -> usize {
        self.recognized + self.no_text + self.skipped
    }
}

/// Crop each detection's box out of `image` and read its text
///
/// Detections are visited in order, one recognition at a time. Boxes that
/// map to an empty rectangle are skipped. Existing text is only ever
/// replaced by a new recognition, never cleared.
pub fn enrich(
    engine: &RecognitionEngine,
    image: &PixelImage,
    detections: &mut [Detection],
    label: &str,
) -> EnrichmentSummary {
    let mut summary = EnrichmentSummary::default();

    for (index, detection) in detections.iter_mut().enumerate() {
        let Some(rect) = to_pixel_rect(&detection.bbox, image.width(), image.height()) else {
            warn!(
                "{}: detection {} has an empty crop after clamping, skipping",
                label, index
            );
            summary.skipped += 1;
            continue;
        };

        let region = image.crop(&rect);
        let recognition = engine.recognize(&region);

        if let Recognition::Recognized { text, confidence } = &recognition {
            info!(
                "{}: detection {} ({}) -> '{}' ({:.2})",
                label, index, detection.class_name, text, confidence
            );
            summary.recognized += 1;
        } else {
            debug!("{}: no text in detection {}", label, index);
            summary.no_text += 1;
        }

        detection.apply_recognition(recognition);
    }

    summary
}
