// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod ocr;
pub mod upload;

pub use detect::{ThresholdQuery, UrlBatchDetectionRequest, UrlDetectionRequest};
pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use handlers::{health_handler, HealthResponse};
pub use http_server::{build_router, start_server, AppState};
pub use ocr::ocr_handler;
