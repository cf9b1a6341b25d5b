// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload of scan reports to the backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::shelf::ScanReport;

/// What the backend said about an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted,
    Rejected { status: u16, body: String },
}

impl UploadOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, UploadOutcome::Accepted)
    }
}

/// Destination for scan reports. Transport failures are errors, a non-2xx
/// reply is an [`UploadOutcome::Rejected`].
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn upload(&self, report: &ScanReport) -> Result<UploadOutcome>;
}

pub struct HttpReportSink {
    client: Client,
    url: String,
}

impl HttpReportSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn upload(&self, report: &ScanReport) -> Result<UploadOutcome> {
        let response = self
            .client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .with_context(|| format!("Report upload to {} failed", self.url))?;

        let status = response.status();
        if status.is_success() {
            info!("Upload succeeded");
            return Ok(UploadOutcome::Accepted);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Upload rejected: HTTP {} {}", status.as_u16(), body);
        Ok(UploadOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
