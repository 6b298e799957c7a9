// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection records exchanged with the upstream detector and API clients
//!
//! Field names are snake_case on the wire to match the detector's JSON.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::vision::ocr::Recognition;

/// Bounding box in normalized [0, 1] image coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// Build a box, deriving `width`/`height` from the corners
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }

    /// The whole frame, (0, 0) to (1, 1)
    pub fn full_frame() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// One detected object, optionally enriched with recognized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: i64,
    pub class_name: String,
    /// Detector score
    pub confidence: f64,
    pub bbox: NormalizedBox,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "ocr_confidence")]
    pub recognition_confidence: Option<f64>,
}

impl Detection {
    /// Class id of records produced without a detector box
    pub const RECOGNITION_ONLY_CLASS_ID: i64 = -1;
    pub const RECOGNITION_ONLY_CLASS_NAME: &'static str = "recognition_only";

    /// Whole-image record for recognition without detection
    pub fn recognition_only(recognition: Recognition) -> Self {
        let mut detection = Self {
            class_id: Self::RECOGNITION_ONLY_CLASS_ID,
            class_name: Self::RECOGNITION_ONLY_CLASS_NAME.to_string(),
            confidence: 1.0,
            bbox: NormalizedBox::full_frame(),
            text: None,
            recognition_confidence: None,
        };
        detection.apply_recognition(recognition);
        detection
    }

    /// Store recognized text; `NoText` leaves existing values untouched
    pub fn apply_recognition(&mut self, recognition: Recognition) -> bool {
        match recognition {
            Recognition::Recognized { text, confidence } => {
                self.text = Some(text);
                self.recognition_confidence = Some(confidence);
                true
            }
            Recognition::NoText => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Detection outcome for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub id: Option<String>,
    pub success: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Detection time as reported by the detector
    pub processing_time_ms: f64,
    pub image_metadata: ImageMetadata,
    #[serde(default)]
    pub detections: Vec<Detection>,
    pub detection_count: usize,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectionResult {
    /// Whether there is anything to enrich
    pub fn has_detections(&self) -> bool {
        self.success && !self.detections.is_empty()
    }
}

/// Outcome of a multi-image request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// End-to-end time measured by this service
    pub total_processing_time_ms: f64,
    #[serde(default)]
    pub results: Vec<DetectionResult>,
    pub total_detections: usize,
    #[serde(default)]
    pub error: Option<String>,
}

/// One image to download in URL batch mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub image_url: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl UrlRecord {
    pub fn new(image_url: impl Into<String>, id: Option<String>) -> Self {
        Self {
            image_url: image_url.into(),
            id,
        }
    }

    /// The caller's `id`, treating an empty string as absent
    pub fn caller_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Key used to match detector results back to this image
    ///
    /// The caller's `id` when given, else the last path segment of the URL.
    pub fn correlation_key(&self) -> String {
        match self.caller_id() {
            Some(id) => id.to_string(),
            None => self
                .image_url
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Accept RFC 3339 timestamps, or naive ones which are taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
