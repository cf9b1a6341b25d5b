// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Polling loop: fetch, process, upload, sleep

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::pipeline::ScanPipeline;
use super::sink::{ReportSink, UploadOutcome};
use super::source::ImageSource;
use crate::shelf::ScanReport;

/// Result of one loop iteration
#[derive(Debug, Clone, PartialEq)]
pub enum IterationResult {
    Uploaded {
        report: ScanReport,
        outcome: UploadOutcome,
    },
    /// The snapshot was unusable and the camera-error report was sent
    CameraErrorReported(UploadOutcome),
}

pub struct ScanRunner {
    source: Arc<dyn ImageSource>,
    pipeline: ScanPipeline,
    sink: Arc<dyn ReportSink>,
    interval: Duration,
    report_camera_errors: bool,
}

impl ScanRunner {
    pub fn new(
        source: Arc<dyn ImageSource>,
        pipeline: ScanPipeline,
        sink: Arc<dyn ReportSink>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            pipeline,
            sink,
            interval,
            report_camera_errors: false,
        }
    }

    pub fn with_camera_error_reports(mut self, enabled: bool) -> Self {
        self.report_camera_errors = enabled;
        self
    }

    /// Run iterations until `shutdown` fires; failures are logged and the
    /// loop carries on after the usual interval.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("Scanner started, interval {:?}", self.interval);
        let mut iterations: u64 = 0;

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            iterations += 1;
            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                res = self.run_once() => res,
            };
            match result {
                Ok(IterationResult::Uploaded { outcome, .. }) if !outcome.is_accepted() => {
                    warn!("Iteration {}: report not accepted", iterations)
                }
                Ok(_) => info!("Iteration {} complete", iterations),
                Err(e) => error!("Iteration {} failed: {:#}", iterations, e),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Scanner stopped after {} iteration(s)", iterations);
    }

    /// One fetch, process and upload
    pub async fn run_once(&self) -> Result<IterationResult> {
        let base64_image = self.source.fetch().await?;

        match self.pipeline.process(&base64_image).await {
            Ok(scan) => {
                for placed in &scan.placed_qrs {
                    info!("Spine {} carries label {}", placed.spine_id, placed.qr_id);
                }
                let outcome = self.sink.upload(&scan.report).await?;
                Ok(IterationResult::Uploaded {
                    report: scan.report,
                    outcome,
                })
            }
            Err(e) if e.is_camera_error() && self.report_camera_errors => {
                warn!("Reporting camera error: {}", e);
                let report = ScanReport::camera_error(self.pipeline.num_groups());
                let outcome = self.sink.upload(&report).await?;
                Ok(IterationResult::CameraErrorReported(outcome))
            }
            Err(e) => Err(anyhow::Error::new(e)),
        }
    }
}
