// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Single-image enrichment tests
//!
//! Covers the upload and URL entry points end to end with a fake detector,
//! a fake image source and a scripted recognizer.

use std::sync::Arc;
use trailer_ocr::{
    detector::{DetectorError, ImageUpload},
    pipeline::{enrich, fetcher::FetchError, NormalizedBox, PipelineError, UrlRecord},
    vision::ocr::{RecognitionEngine, TextLine},
    vision::{decode_image_bytes, to_pixel_rect, PixelRect},
};

use crate::common::{detection, png_bytes, pipeline, EchoDetector, MapSource, ScriptedRecognizer};

fn upload(name: &str, width: u32, height: u32) -> ImageUpload {
    ImageUpload::new(name, Some("image/png".to_string()), png_bytes(width, height))
}

#[tokio::test]
async fn test_box_inside_image_gets_text() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![NormalizedBox::new(
        0.1, 0.1, 0.5, 0.5,
    )]));
    let (recognizer, regions) = ScriptedRecognizer::reading("TRLR123", 0.95);
    let pipeline = pipeline(detector.clone(), Arc::new(MapSource::default()), recognizer);

    let result = pipeline
        .detect_and_enrich(upload("yard.png", 100, 100), 0.5)
        .await
        .unwrap();

    assert!(result.success);
    let enriched = &result.detections[0];
    assert_eq!(enriched.text.as_deref(), Some("TRLR123"));
    assert_eq!(enriched.recognition_confidence, Some(0.95));
    assert_eq!(*regions.lock().unwrap(), vec![(40, 40)]);
    assert_eq!(detector.call_count(), 1);
}

#[tokio::test]
async fn test_box_outside_image_leaves_text_unset() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![NormalizedBox::new(
        1.2, 1.1, 1.8, 1.9,
    )]));
    let (recognizer, regions) = ScriptedRecognizer::reading("NEVER", 0.9);
    let pipeline = pipeline(detector, Arc::new(MapSource::default()), recognizer);

    let result = pipeline
        .detect_and_enrich(upload("yard.png", 64, 48), 0.0)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.detections.len(), 1);
    assert!(result.detections[0].text.is_none());
    assert!(result.detections[0].recognition_confidence.is_none());
    assert!(regions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_multi_line_text_is_joined() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![NormalizedBox::full_frame()]));
    let (recognizer, _) = ScriptedRecognizer::new(vec![
        TextLine::new("AB", 0.9),
        TextLine::new("12", 0.7),
    ]);
    let pipeline = pipeline(detector, Arc::new(MapSource::default()), recognizer);

    let result = pipeline
        .detect_and_enrich(upload("two-lines.png", 32, 32), 0.0)
        .await
        .unwrap();

    assert_eq!(result.detections[0].text.as_deref(), Some("AB 12"));
    assert_eq!(result.detections[0].recognition_confidence, Some(0.8));
}

#[tokio::test]
async fn test_no_detections_skips_recognition() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![]));
    let (recognizer, regions) = ScriptedRecognizer::reading("X", 1.0);
    let pipeline = pipeline(detector, Arc::new(MapSource::default()), recognizer);

    let result = pipeline
        .detect_and_enrich(upload("empty.png", 16, 16), 0.0)
        .await
        .unwrap();

    assert!(result.detections.is_empty());
    assert!(regions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_detector_failure_is_request_failure() {
    let detector = Arc::new(EchoDetector::failing(DetectorError::Unreachable(
        "connection refused".to_string(),
    )));
    let (recognizer, _) = ScriptedRecognizer::reading("X", 1.0);
    let pipeline = pipeline(detector, Arc::new(MapSource::default()), recognizer);

    let err = pipeline
        .detect_and_enrich(upload("a.png", 8, 8), 0.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Upstream(DetectorError::Unreachable(_))
    ));
}

#[tokio::test]
async fn test_url_mode_uses_url_tail_as_filename() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![NormalizedBox::full_frame()]));
    let source = Arc::new(
        MapSource::default().with("https://cdn.example.com/yard/cam3.png", Ok(png_bytes(20, 10))),
    );
    let (recognizer, regions) = ScriptedRecognizer::reading("TRLR9", 0.6);
    let pipeline = pipeline(detector.clone(), source, recognizer);

    let record = UrlRecord::new("https://cdn.example.com/yard/cam3.png", None);
    let result = pipeline.detect_and_enrich_url(record, 0.3).await.unwrap();

    assert_eq!(detector.calls.lock().unwrap()[0], vec!["cam3.png".to_string()]);
    assert_eq!(result.id, None);
    assert_eq!(result.detections[0].text.as_deref(), Some("TRLR9"));
    assert_eq!(*regions.lock().unwrap(), vec![(20, 10)]);
}

#[tokio::test]
async fn test_url_mode_id_overrides() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![]));
    let source = Arc::new(MapSource::default().with("http://cdn/a.png", Ok(png_bytes(8, 8))));
    let (recognizer, _) = ScriptedRecognizer::reading("X", 1.0);
    let pipeline = pipeline(detector.clone(), source, recognizer);

    let record = UrlRecord::new("http://cdn/a.png", Some("trailer-42".to_string()));
    let result = pipeline.detect_and_enrich_url(record, 0.0).await.unwrap();

    assert_eq!(result.id.as_deref(), Some("trailer-42"));
    assert_eq!(detector.calls.lock().unwrap()[0], vec!["trailer-42".to_string()]);
}

#[tokio::test]
async fn test_url_mode_download_failure() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![]));
    let source = Arc::new(MapSource::default().with(
        "http://cdn/slow.png",
        Err(FetchError::Timeout("http://cdn/slow.png".to_string())),
    ));
    let (recognizer, _) = ScriptedRecognizer::reading("X", 1.0);
    let pipeline = pipeline(detector.clone(), source, recognizer);

    let err = pipeline
        .detect_and_enrich_url(UrlRecord::new("http://cdn/slow.png", None), 0.0)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Fetch(FetchError::Timeout(_))));
    assert_eq!(detector.call_count(), 0);
}

#[tokio::test]
async fn test_url_mode_undecodable_download() {
    let detector = Arc::new(EchoDetector::with_boxes(vec![]));
    let source = Arc::new(MapSource::default().with("http://cdn/page.html", Ok(b"<html>".to_vec())));
    let (recognizer, _) = ScriptedRecognizer::reading("X", 1.0);
    let pipeline = pipeline(detector.clone(), source, recognizer);

    let err = pipeline
        .detect_and_enrich_url(UrlRecord::new("http://cdn/page.html", None), 0.0)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)));
    assert_eq!(detector.call_count(), 0);
}

#[test]
fn test_enrich_twice_is_stable() {
    let (recognizer, _) = ScriptedRecognizer::new(vec![
        TextLine::new("TRLR", 0.8),
        TextLine::new("123", 0.6),
    ]);
    let engine = RecognitionEngine::new(recognizer);
    let image = decode_image_bytes(&png_bytes(50, 50)).unwrap();
    let mut detections = vec![
        detection(NormalizedBox::new(0.0, 0.0, 0.5, 0.5)),
        detection(NormalizedBox::new(0.5, 0.5, 0.5, 0.9)),
    ];

    enrich(&engine, &image, &mut detections, "first");
    let after_first = detections.clone();
    enrich(&engine, &image, &mut detections, "second");

    assert_eq!(detections, after_first);
    assert_eq!(detections[0].text.as_deref(), Some("TRLR 123"));
    assert!(detections[1].text.is_none());
}

#[test]
fn test_reference_box_mapping() {
    let rect = to_pixel_rect(&NormalizedBox::new(0.1, 0.1, 0.5, 0.5), 100, 100).unwrap();
    assert_eq!(
        rect,
        PixelRect {
            x1: 10,
            y1: 10,
            x2: 50,
            y2: 50
        }
    );
}
