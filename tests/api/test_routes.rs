// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP surface tests
//!
//! Drives the router with `oneshot` against fake collaborators and checks
//! status codes and JSON bodies for every endpoint.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`
use trailer_ocr::{
    api::http_server::{build_router, AppState},
    detector::DetectorError,
    pipeline::NormalizedBox,
};

use crate::common::{png_bytes, pipeline, EchoDetector, MapSource, ScriptedRecognizer};

const BOUNDARY: &str = "trailer-ocr-test-boundary";
const BODY_LIMIT: usize = 50 * 1024 * 1024;

fn app_with(detector: EchoDetector, source: MapSource) -> Router {
    let (recognizer, _) = ScriptedRecognizer::reading("TRLR123", 0.95);
    let state = AppState::new(pipeline(Arc::new(detector), Arc::new(source), recognizer));
    build_router(state, BODY_LIMIT)
}

fn app() -> Router {
    app_with(
        EchoDetector::with_boxes(vec![NormalizedBox::new(0.1, 0.1, 0.5, 0.5)]),
        MapSource::default(),
    )
}

/// Build a multipart body from `(field, filename, bytes)` parts
fn multipart_body(parts: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[(&str, &str, Vec<u8>)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "trailer-ocr");
    assert_eq!(body["ocr_status"], "initialized");
}

#[tokio::test]
async fn test_detect_and_ocr_enriches_upload() {
    let request = multipart_request(
        "/detect-and-ocr?confidence_threshold=0.5",
        &[("file", "yard.png", png_bytes(100, 100))],
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["image_metadata"]["filename"], "yard.png");
    let detection = &body["detections"][0];
    assert_eq!(detection["text"], "TRLR123");
    assert_eq!(detection["ocr_confidence"].as_f64(), Some(0.95));
    assert_eq!(detection["class_name"], "trailer_id");
}

#[tokio::test]
async fn test_detect_and_ocr_threshold_out_of_range() {
    let request = multipart_request(
        "/detect-and-ocr?confidence_threshold=1.5",
        &[("file", "yard.png", png_bytes(10, 10))],
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "confidence_threshold");
}

#[tokio::test]
async fn test_detect_and_ocr_missing_file() {
    let request = multipart_request(
        "/detect-and-ocr",
        &[("attachment", "yard.png", png_bytes(10, 10))],
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "file");
}

#[tokio::test]
async fn test_detect_and_ocr_invalid_image() {
    let request = multipart_request(
        "/detect-and-ocr",
        &[("file", "notes.txt", b"plain text".to_vec())],
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_image");
}

#[tokio::test]
async fn test_detector_status_is_forwarded() {
    let app = app_with(
        EchoDetector::failing(DetectorError::Status {
            status: 503,
            body: "overloaded".to_string(),
        }),
        MapSource::default(),
    );
    let request = multipart_request("/detect-and-ocr", &[("file", "a.png", png_bytes(8, 8))]);
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Detector failed: overloaded");
}

#[tokio::test]
async fn test_detector_timeout_is_gateway_timeout() {
    let app = app_with(
        EchoDetector::failing(DetectorError::Timeout(120)),
        MapSource::default(),
    );
    let request = multipart_request("/detect-and-ocr", &[("file", "a.png", png_bytes(8, 8))]);
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_batch_upload() {
    let request = multipart_request(
        "/detect-and-ocr/batch?confidence_threshold=0.25",
        &[
            ("files", "one.png", png_bytes(20, 20)),
            ("files", "two.png", png_bytes(30, 30)),
        ],
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["image_metadata"]["filename"], "two.png");
    assert_eq!(results[1]["detections"][0]["text"], "TRLR123");
    assert!(body["total_processing_time_ms"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_batch_upload_without_files() {
    let request = multipart_request("/detect-and-ocr/batch", &[]);
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No files uploaded");
}

#[tokio::test]
async fn test_url_detection() {
    let app = app_with(
        EchoDetector::with_boxes(vec![NormalizedBox::full_frame()]),
        MapSource::default().with("http://cdn/yard/cam1.png", Ok(png_bytes(40, 20))),
    );
    let request = json_request(
        "/detect-and-ocr/url",
        serde_json::json!({"image_url": "http://cdn/yard/cam1.png", "id": "gate-1"}),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "gate-1");
    assert_eq!(body["detections"][0]["text"], "TRLR123");
}

#[tokio::test]
async fn test_url_detection_download_failure() {
    let request = json_request(
        "/detect-and-ocr/url",
        serde_json::json!({"image_url": "http://cdn/missing.png"}),
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "download_failed");
}

#[tokio::test]
async fn test_url_detection_malformed_json() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/detect-and-ocr/url")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"image_url\": "))
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_url_batch_wrong_images_type() {
    let request = json_request(
        "/detect-and-ocr/url/batch",
        serde_json::json!({"images": "http://cdn/a.png"}),
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_url_batch() {
    let app = app_with(
        EchoDetector::with_boxes(vec![NormalizedBox::full_frame()]),
        MapSource::default()
            .with("http://cdn/a.png", Ok(png_bytes(10, 10)))
            .with("http://cdn/c.png", Ok(png_bytes(10, 10))),
    );
    let request = json_request(
        "/detect-and-ocr/url/batch",
        serde_json::json!({
            "images": [
                {"image_url": "http://cdn/a.png"},
                {"image_url": "http://cdn/b.png"},
                {"image_url": "http://cdn/c.png", "id": "third"}
            ],
            "confidence_threshold": 0.4
        }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["image_metadata"]["filename"], "a.png");
    assert_eq!(results[1]["image_metadata"]["filename"], "third");
}

#[tokio::test]
async fn test_url_batch_empty_images() {
    let request = json_request("/detect-and-ocr/url/batch", serde_json::json!({"images": []}));
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No images provided");
}

#[tokio::test]
async fn test_url_batch_nothing_downloaded() {
    let request = json_request(
        "/detect-and-ocr/url/batch",
        serde_json::json!({"images": [{"image_url": "http://cdn/gone.png"}]}),
    );
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "empty_batch");
    assert_eq!(body["message"], "No valid images could be downloaded");
}

#[tokio::test]
async fn test_ocr_only() {
    let request = multipart_request("/ocr", &[("file", "plate.png", png_bytes(64, 16))]);
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class_id"], -1);
    assert_eq!(body["class_name"], "recognition_only");
    assert_eq!(body["confidence"], 1.0);
    assert_eq!(body["bbox"]["x_max"], 1.0);
    assert_eq!(body["bbox"]["height"], 1.0);
    assert_eq!(body["text"], "TRLR123");
}

#[tokio::test]
async fn test_detect_route_rejects_get() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/detect-and-ocr")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
