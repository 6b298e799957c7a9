// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection enrichment pipeline
//!
//! - `types` - Detection records and their wire format
//! - `fetcher` - Image download for URL modes
//! - `enricher` - Per-image crop and recognize loop
//! - `orchestrator` - Single and batch entry points

pub mod enricher;
pub mod fetcher;
pub mod orchestrator;
pub mod types;

pub use enricher::{enrich, EnrichmentSummary};
pub use fetcher::{FetchError, HttpImageFetcher, ImageSource};
pub use orchestrator::{enrich_batch, EnrichmentPipeline, ImageTable, PipelineError};
pub use types::{BatchResult, Detection, DetectionResult, ImageMetadata, NormalizedBox, UrlRecord};
