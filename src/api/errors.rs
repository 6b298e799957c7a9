// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

use crate::detector::DetectorError;
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    InvalidImage(String),
    DownloadFailed(String),
    EmptyBatch(String),
    /// Detector answered with an error status, forwarded as-is
    Upstream {
        status: u16,
        message: String,
    },
    BadGateway(String),
    Timeout(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::InvalidImage(msg) => ("invalid_image", msg.clone(), None),
            ApiError::DownloadFailed(msg) => ("download_failed", msg.clone(), None),
            ApiError::EmptyBatch(msg) => ("empty_batch", msg.clone(), None),
            ApiError::Upstream { status, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "upstream_status".to_string(),
                    serde_json::Value::Number((*status).into()),
                );
                ("upstream_error", message.clone(), Some(details))
            }
            ApiError::BadGateway(msg) => ("bad_gateway", msg.clone(), None),
            ApiError::Timeout(msg) => ("timeout", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::InvalidImage(_)
            | ApiError::DownloadFailed(_)
            | ApiError::EmptyBatch(_) => 400,
            ApiError::Upstream { status, .. } => *status,
            ApiError::BadGateway(_) => 502,
            ApiError::Timeout(_) => 504,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            ApiError::DownloadFailed(msg) => write!(f, "Download failed: {}", msg),
            ApiError::EmptyBatch(msg) => write!(f, "Empty batch: {}", msg),
            ApiError::Upstream { status, message } => {
                write!(f, "Detector returned {}: {}", status, message)
            }
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Decode(e) => ApiError::InvalidImage(e.to_string()),
            PipelineError::Fetch(e) => ApiError::DownloadFailed(e.to_string()),
            PipelineError::Upstream(e) => e.into(),
            PipelineError::EmptyBatch(msg) => ApiError::EmptyBatch(msg),
            PipelineError::NoFiles => ApiError::InvalidRequest("No files uploaded".to_string()),
            PipelineError::Worker(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        let message = err.to_string();
        match err {
            // A status outside the valid range cannot be forwarded
            DetectorError::Status { status, .. } if (100..600).contains(&status) => {
                ApiError::Upstream { status, message }
            }
            DetectorError::Status { .. }
            | DetectorError::Unreachable(_)
            | DetectorError::InvalidResponse(_) => ApiError::BadGateway(message),
            DetectorError::Timeout(_) => ApiError::Timeout(message),
            DetectorError::InvalidRequest(_) => ApiError::InternalError(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(format!("Malformed JSON body: {}", rejection.body_text()))
    }
}

/// Error response wrapper
#[derive(Debug)]
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<PipelineError> for ApiErrorResponse {
    fn from(err: PipelineError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }

        (status, Json(self.0.to_response())).into_response()
    }
}
