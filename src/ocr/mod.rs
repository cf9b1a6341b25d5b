// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition for shelf snapshots
//!
//! Spine titles are read by a cloud OCR service; only the text and the
//! axis-aligned envelope of each recognised span are kept.

pub mod clova;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::vision::BoundingBox;

pub use clova::ClovaOcrClient;

/// A recognised text span and where it was found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrBox {
    pub text: String,
    pub bbox: BoundingBox,
}

/// Errors that can occur while calling an OCR service
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR {0} is not configured")]
    NotConfigured(&'static str),

    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Invalid OCR response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Trait for OCR backends
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognise text in an encoded image
    ///
    /// # Arguments
    /// * `image_bytes` - The image exactly as fetched (PNG, JPEG, ...)
    /// * `format` - Lower-case extension of the encoding, e.g. "jpg"
    async fn recognize(&self, image_bytes: &[u8], format: &str) -> Result<Vec<OcrBox>, OcrError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
