// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mocks and a local backend shared by the scanner tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use bookiki_edge::ocr::{OcrBox, OcrError, TextRecognizer};
use bookiki_edge::scanner::ScanPipeline;
use bookiki_edge::vision::{BoundingBox, DecodedQr, QrScanner, SpineDetection, SpineDetector};
use image::DynamicImage;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// 1x1 red PNG
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

pub struct FixedDetector(pub Vec<SpineDetection>);

impl SpineDetector for FixedDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<SpineDetection>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FixedRecognizer {
    pub boxes: Vec<OcrBox>,
    pub calls: AtomicUsize,
    pub formats: Mutex<Vec<String>>,
}

impl FixedRecognizer {
    pub fn new(boxes: Vec<OcrBox>) -> Self {
        Self {
            boxes,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextRecognizer for FixedRecognizer {
    async fn recognize(&self, _image_bytes: &[u8], format: &str) -> Result<Vec<OcrBox>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.formats.lock().unwrap().push(format.to_string());
        Ok(self.boxes.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

pub struct FailingRecognizer;

#[async_trait]
impl TextRecognizer for FailingRecognizer {
    async fn recognize(&self, _image_bytes: &[u8], _format: &str) -> Result<Vec<OcrBox>, OcrError> {
        Err(OcrError::Api {
            status: 401,
            body: "invalid secret".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub struct FixedQrScanner(pub Vec<DecodedQr>);

impl QrScanner for FixedQrScanner {
    fn scan(&self, _image: &DynamicImage) -> Vec<DecodedQr> {
        self.0.clone()
    }
}

/// `count` spines, 100 px apart, each 90 px wide
pub fn spines(count: usize) -> Vec<SpineDetection> {
    (0..count)
        .map(|i| SpineDetection {
            id: i,
            bbox: BoundingBox::new(i as f32 * 100.0, 0.0, i as f32 * 100.0 + 90.0, 600.0),
            confidence: 0.9,
            label: "book".to_string(),
        })
        .collect()
}

/// A QR label near the bottom of the spine starting at `x`
pub fn qr(x: f32, book_id: &str) -> DecodedQr {
    DecodedQr {
        payload: format!("https://bookiki.example/books/{}", book_id),
        bbox: BoundingBox::new(x + 10.0, 500.0, x + 60.0, 550.0),
    }
}

pub fn ocr(text: &str, x: f32, y: f32) -> OcrBox {
    OcrBox {
        text: text.to_string(),
        bbox: BoundingBox::new(x + 5.0, y, x + 80.0, y + 30.0),
    }
}

pub fn pipeline(
    detections: Vec<SpineDetection>,
    recognizer: Arc<dyn TextRecognizer>,
    qrs: Vec<DecodedQr>,
) -> ScanPipeline {
    ScanPipeline::new(
        Arc::new(FixedDetector(detections)),
        recognizer,
        Arc::new(FixedQrScanner(qrs)),
        3,
    )
}

#[derive(Clone)]
struct BackendState {
    image_status: StatusCode,
    image_body: String,
    report_status: StatusCode,
    reports: Arc<Mutex<Vec<Value>>>,
}

/// Stand-in for the library backend: serves a snapshot and records reports
pub struct Backend {
    pub addr: SocketAddr,
    pub reports: Arc<Mutex<Vec<Value>>>,
}

impl Backend {
    pub fn image_url(&self) -> String {
        format!("http://{}/api/iot-storage", self.addr)
    }

    pub fn report_url(&self) -> String {
        format!("http://{}/api/books/return/scan", self.addr)
    }

    pub fn reports(&self) -> Vec<Value> {
        self.reports.lock().unwrap().clone()
    }
}

async fn image_handler(State(state): State<BackendState>) -> (StatusCode, String) {
    (state.image_status, state.image_body.clone())
}

async fn report_handler(State(state): State<BackendState>, Json(body): Json<Value>) -> StatusCode {
    state.reports.lock().unwrap().push(body);
    state.report_status
}

pub async fn start_backend(
    image_status: StatusCode,
    image_body: &str,
    report_status: StatusCode,
) -> Backend {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        image_status,
        image_body: image_body.to_string(),
        report_status,
        reports: reports.clone(),
    };

    let app = Router::new()
        .route("/api/iot-storage", get(image_handler))
        .route("/api/books/return/scan", post(report_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend { addr, reports }
}
