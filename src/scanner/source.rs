// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Where shelf snapshots come from

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Yields the latest snapshot as base64 text
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Snapshot storage exposed over HTTP; the body is the base64 image
pub struct HttpImageSource {
    client: Client,
    url: String,
}

impl HttpImageSource {
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

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Image request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Image fetch failed with HTTP {}", status.as_u16());
        }

        let body = response.text().await.context("Failed to read image body")?;
        let body = body.trim();
        if body.is_empty() {
            anyhow::bail!("Image endpoint returned an empty body");
        }

        debug!("Fetched {} base64 characters", body.len());
        Ok(body.to_string())
    }
}
