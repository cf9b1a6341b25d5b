// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! One snapshot in, one scan report out

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::ocr::{OcrError, TextRecognizer};
use crate::shelf::{build_report, ShelfScan};
use crate::vision::image_utils::{decode_base64_image, format_to_extension, DecodedImage, ImageError};
use crate::vision::{QrScanner, SpineDetector};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("snapshot could not be decoded: {0}")]
    Image(#[from] ImageError),

    #[error("spine detection failed: {0:#}")]
    Detection(anyhow::Error),

    #[error("text recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

impl ScanError {
    /// True when the camera produced something unusable
    pub fn is_camera_error(&self) -> bool {
        matches!(self, ScanError::Image(_))
    }
}

pub struct ScanPipeline {
    detector: Arc<dyn SpineDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    qr_scanner: Arc<dyn QrScanner>,
    num_groups: usize,
}

impl ScanPipeline {
    pub fn new(
        detector: Arc<dyn SpineDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        qr_scanner: Arc<dyn QrScanner>,
        num_groups: usize,
    ) -> Self {
        Self {
            detector,
            recognizer,
            qr_scanner,
            num_groups,
        }
    }

    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    pub async fn process(&self, base64_image: &str) -> Result<ShelfScan, ScanError> {
        let decoded = decode_base64_image(base64_image)?;
        self.process_image(decoded).await
    }

    /// Detect spines, read their text and QR labels, and build the report.
    /// An OCR failure aborts the whole snapshot.
    pub async fn process_image(&self, decoded: DecodedImage) -> Result<ShelfScan, ScanError> {
        let start = Instant::now();
        info!(
            "Processing {}x{} snapshot ({} bytes)",
            decoded.info.width, decoded.info.height, decoded.info.size_bytes
        );

        let image = Arc::new(decoded.image);

        let detector = self.detector.clone();
        let frame = image.clone();
        let spines = tokio::task::spawn_blocking(move || detector.detect(&frame))
            .await
            .map_err(|e| ScanError::Detection(e.into()))?
            .map_err(ScanError::Detection)?;
        debug!("{} spines detected", spines.len());

        let format = format_to_extension(decoded.info.format);
        let ocr_boxes = self.recognizer.recognize(&decoded.bytes, format).await?;
        debug!("{} OCR boxes from {}", ocr_boxes.len(), self.recognizer.name());

        let scanner = self.qr_scanner.clone();
        let frame = image.clone();
        let qrs = tokio::task::spawn_blocking(move || scanner.scan(&frame))
            .await
            .map_err(|e| ScanError::Detection(e.into()))?;
        debug!("{} QR labels decoded", qrs.len());

        let scan = build_report(&spines, &ocr_boxes, &qrs, self.num_groups);
        info!(
            "Snapshot processed in {:?}: {} spines, {} placed labels, {} books",
            start.elapsed(),
            spines.len(),
            scan.placed_qrs.len(),
            scan.report.shelf_book_items_map.book_count()
        );
        Ok(scan)
    }
}
