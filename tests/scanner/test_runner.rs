// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use bookiki_edge::scanner::{HttpImageSource, HttpReportSink, IterationResult, ScanPipeline, ScanRunner, UploadOutcome};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::common::{
    ocr, pipeline, qr, spines, start_backend, Backend, FailingRecognizer, FixedRecognizer, TINY_PNG_BASE64,
};

fn runner(backend: &Backend, pipeline: ScanPipeline, interval: Duration) -> ScanRunner {
    let timeout = Duration::from_secs(5);
    ScanRunner::new(
        Arc::new(HttpImageSource::new(backend.image_url(), timeout).unwrap()),
        pipeline,
        Arc::new(HttpReportSink::new(backend.report_url(), timeout).unwrap()),
        interval,
    )
}

fn shelf_pipeline() -> ScanPipeline {
    pipeline(
        spines(4),
        Arc::new(FixedRecognizer::new(vec![ocr("SAPIENS", 100.0, 40.0)])),
        vec![qr(300.0, "4"), qr(0.0, "1"), qr(200.0, "3"), qr(100.0, "2")],
    )
}

#[tokio::test]
async fn test_run_once_uploads_report() {
    let backend = start_backend(StatusCode::OK, TINY_PNG_BASE64, StatusCode::OK).await;
    let runner = runner(&backend, shelf_pipeline(), Duration::from_secs(10));

    let result = runner.run_once().await.unwrap();
    assert!(matches!(result, IterationResult::Uploaded { outcome: UploadOutcome::Accepted, .. }));

    assert_eq!(
        backend.reports(),
        vec![json!({
            "ocrResults": ["SAPIENS"],
            "shelfBookItemsMap": {"0": [0], "1": [1, 2], "2": [3], "3": [4]}
        })]
    );
}

#[tokio::test]
async fn test_camera_error_reported_when_enabled() {
    let backend = start_backend(StatusCode::OK, "bm90IGFuIGltYWdl", StatusCode::OK).await;
    let runner = runner(&backend, shelf_pipeline(), Duration::from_secs(10)).with_camera_error_reports(true);

    let result = runner.run_once().await.unwrap();
    assert_eq!(result, IterationResult::CameraErrorReported(UploadOutcome::Accepted));
    assert_eq!(
        backend.reports(),
        vec![json!({
            "ocrResults": [],
            "shelfBookItemsMap": {"0": [1], "1": [], "2": [], "3": []}
        })]
    );
}

#[tokio::test]
async fn test_bad_image_skipped_by_default() {
    let backend = start_backend(StatusCode::OK, "bm90IGFuIGltYWdl", StatusCode::OK).await;
    let runner = runner(&backend, shelf_pipeline(), Duration::from_secs(10));

    assert!(runner.run_once().await.is_err());
    assert!(backend.reports().is_empty());
}

#[tokio::test]
async fn test_ocr_failure_skips_upload() {
    let backend = start_backend(StatusCode::OK, TINY_PNG_BASE64, StatusCode::OK).await;
    let pipeline = pipeline(spines(2), Arc::new(FailingRecognizer), vec![qr(0.0, "1")]);
    let runner = runner(&backend, pipeline, Duration::from_secs(10)).with_camera_error_reports(true);

    assert!(runner.run_once().await.is_err());
    assert!(backend.reports().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_is_error() {
    let backend = start_backend(StatusCode::INTERNAL_SERVER_ERROR, "", StatusCode::OK).await;
    let runner = runner(&backend, shelf_pipeline(), Duration::from_secs(10));

    assert!(runner.run_once().await.is_err());
    assert!(backend.reports().is_empty());
}

#[tokio::test]
async fn test_run_loop_repeats_and_stops_on_cancel() {
    let backend = start_backend(StatusCode::OK, TINY_PNG_BASE64, StatusCode::OK).await;
    let runner = runner(&backend, shelf_pipeline(), Duration::from_millis(50));

    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { runner.run(shutdown).await }
    });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while backend.reports().len() < 2 {
        assert!(tokio::time::Instant::now() < deadline, "scanner did not repeat");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("scanner did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_run_loop_survives_failures() {
    let backend = start_backend(StatusCode::SERVICE_UNAVAILABLE, "", StatusCode::OK).await;
    let runner = runner(&backend, shelf_pipeline(), Duration::from_millis(20));

    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { runner.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!task.is_finished());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}
