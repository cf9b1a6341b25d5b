// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shelf scanner service
//!
//! Periodically pulls the latest shelf snapshot, finds the book spines,
//! reads their titles and QR labels and uploads the result.

pub mod pipeline;
pub mod runner;
pub mod sink;
pub mod source;

pub use pipeline::{ScanError, ScanPipeline};
pub use runner::{IterationResult, ScanRunner};
pub use sink::{HttpReportSink, ReportSink, UploadOutcome};
pub use source::{HttpImageSource, ImageSource};

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::EdgeConfig;
use crate::ocr::ClovaOcrClient;
use crate::vision::{RqrrScanner, YoloSpineDetector};

/// Pipeline with the production detector, OCR client and QR scanner
pub fn pipeline_from_config(config: &EdgeConfig) -> Result<ScanPipeline> {
    let detector = YoloSpineDetector::new(&config.detector)?;
    let recognizer = ClovaOcrClient::new(&config.ocr).context("Clova OCR is not usable")?;

    Ok(ScanPipeline::new(
        Arc::new(detector),
        Arc::new(recognizer),
        Arc::new(RqrrScanner::new()),
        config.scanner.shelf_groups,
    ))
}

/// Polling loop wired to the configured HTTP endpoints
pub fn runner_from_config(config: &EdgeConfig) -> Result<ScanRunner> {
    let timeout = config.scanner.request_timeout();
    let source = HttpImageSource::new(config.scanner.image_url.clone(), timeout)?;
    let sink = HttpReportSink::new(config.scanner.report_url.clone(), timeout)?;

    Ok(ScanRunner::new(
        Arc::new(source),
        pipeline_from_config(config)?,
        Arc::new(sink),
        config.scanner.interval(),
    )
    .with_camera_error_reports(config.scanner.report_camera_errors))
}
