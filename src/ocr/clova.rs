// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Clova OCR (General) client for text on book spines

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{OcrBox, OcrError, TextRecognizer};
use crate::config::OcrConfig;
use crate::vision::BoundingBox;

/// Header carrying the per-domain secret key
pub const SECRET_HEADER: &str = "X-OCR-SECRET";

const API_VERSION: &str = "V2";
const IMAGE_NAME: &str = "sample_image";

// --- Clova request / response serde structs ---

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ClovaRequest {
    images: Vec<ClovaImage>,
    request_id: String,
    version: String,
    timestamp: i64,
}

#[derive(Debug, serde::Serialize)]
struct ClovaImage {
    format: String,
    name: String,
    data: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ClovaResponse {
    #[serde(default)]
    images: Vec<ClovaImageResult>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ClovaImageResult {
    #[serde(default)]
    fields: Vec<ClovaField>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClovaField {
    infer_text: String,
    bounding_poly: ClovaPoly,
}

#[derive(Debug, serde::Deserialize)]
struct ClovaPoly {
    #[serde(default)]
    vertices: Vec<ClovaVertex>,
}

#[derive(Debug, serde::Deserialize)]
struct ClovaVertex {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

impl ClovaResponse {
    fn into_boxes(self) -> Vec<OcrBox> {
        self.images
            .into_iter()
            .flat_map(|image| image.fields)
            .filter_map(|field| {
                let points: Vec<(f32, f32)> = field
                    .bounding_poly
                    .vertices
                    .iter()
                    .map(|v| (v.x, v.y))
                    .collect();
                BoundingBox::enclosing(&points).map(|bbox| OcrBox {
                    text: field.infer_text,
                    bbox,
                })
            })
            .collect()
    }
}

/// Parse a raw Clova OCR response body into text boxes
pub fn parse_response(body: &str) -> Result<Vec<OcrBox>, OcrError> {
    let response: ClovaResponse = serde_json::from_str(body)?;
    Ok(response.into_boxes())
}

/// Client for the Clova OCR General API
pub struct ClovaOcrClient {
    client: Client,
    endpoint: String,
    secret: String,
}

impl ClovaOcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(OcrError::NotConfigured("endpoint"))?;
        let secret = config
            .secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(OcrError::NotConfigured("secret"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Clova OCR client configured: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            secret: secret.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(image_bytes: &[u8], format: &str) -> ClovaRequest {
        ClovaRequest {
            images: vec![ClovaImage {
                format: format.to_string(),
                name: IMAGE_NAME.to_string(),
                data: STANDARD.encode(image_bytes),
            }],
            request_id: uuid::Uuid::new_v4().to_string(),
            version: API_VERSION.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[async_trait]
impl TextRecognizer for ClovaOcrClient {
    async fn recognize(&self, image_bytes: &[u8], format: &str) -> Result<Vec<OcrBox>, OcrError> {
        let start = std::time::Instant::now();
        let request = Self::build_request(image_bytes, format);

        let response = self
            .client
            .post(&self.endpoint)
            .header(SECRET_HEADER, &self.secret)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OcrError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let boxes = parse_response(&body)?;
        debug!(
            "Clova OCR returned {} text boxes in {}ms",
            boxes.len(),
            start.elapsed().as_millis()
        );
        Ok(boxes)
    }

    fn name(&self) -> &'static str {
        "clova"
    }
}
