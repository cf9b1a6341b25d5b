// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the edge programs
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables (a `.env` file is honoured by the binary).
//!
//! ```toml
//! [scanner]
//! image_url = "http://localhost:8088/api/iot-storage"
//! interval_secs = 10
//!
//! [ocr]
//! endpoint = "https://.../general"
//! secret = "..."
//!
//! [led]
//! spi_device = "/dev/spidev0.0"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::led::{ColorOrder, Rgb};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "bookiki.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Shelf scanner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Endpoint serving the latest snapshot as base64 text
    pub image_url: String,
    /// Endpoint receiving the scan report
    pub report_url: String,
    /// Pause between iterations
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub shelf_groups: usize,
    /// Upload a status-only report when a snapshot cannot be decoded
    pub report_camera_errors: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            image_url: "http://i12a206.p.ssafy.io:8088/api/iot-storage".to_string(),
            report_url: "http://i12a206.p.ssafy.io:8088/api/books/return/scan".to_string(),
            interval_secs: 10,
            request_timeout_secs: 30,
            shelf_groups: crate::shelf::DEFAULT_SHELF_GROUPS,
            report_camera_errors: false,
        }
    }
}

impl ScannerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Spine detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// YOLOv8 ONNX export
    pub model_path: String,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// COCO class kept as a spine
    pub label: String,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "./models/yolov8m.onnx".to_string(),
            input_size: crate::vision::preprocessing::YOLO_INPUT_SIZE,
            confidence_threshold: 0.5,
            iou_threshold: 0.4,
            label: "book".to_string(),
            intra_threads: 4,
        }
    }
}

/// OCR service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub endpoint: Option<String>,
    pub secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            secret: None,
            timeout_secs: 30,
        }
    }
}

/// LED range lit for one shelf id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfLight {
    pub shelf_id: i64,
    /// First LED index (inclusive)
    pub start: usize,
    /// Last LED index (inclusive)
    pub end: usize,
    pub color: Rgb,
}

/// LED shelf indicator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    pub ws_url: String,
    /// SPI device node; frames are only logged when unset
    pub spi_device: Option<String>,
    pub count: usize,
    pub brightness: f32,
    pub color_order: ColorOrder,
    pub hold_secs: u64,
    pub settle_ms: u64,
    pub reconnect_delay_secs: u64,
    pub shelves: Vec<ShelfLight>,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://i12a206.p.ssafy.io:8088/iot/ws".to_string(),
            spi_device: None,
            count: 26,
            brightness: 0.2,
            color_order: ColorOrder::Grb,
            hold_secs: 10,
            settle_ms: 500,
            reconnect_delay_secs: 3,
            shelves: vec![
                ShelfLight {
                    shelf_id: 1,
                    start: 0,
                    end: 8,
                    color: Rgb::RED,
                },
                ShelfLight {
                    shelf_id: 2,
                    start: 9,
                    end: 16,
                    color: Rgb::GREEN,
                },
                ShelfLight {
                    shelf_id: 3,
                    start: 17,
                    end: 25,
                    color: Rgb::BLUE,
                },
            ],
        }
    }
}

impl LedConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_secs(self.hold_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

/// Bench-test server/client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub listen_addr: String,
    pub server_url: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8765".to_string(),
            server_url: "ws://localhost:8765".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub scanner: ScannerConfig,
    pub detector: DetectorConfig,
    pub ocr: OcrConfig,
    pub led: LedConfig,
    pub demo: DemoConfig,
}

impl EdgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve the configuration the binary runs with
    ///
    /// An explicit path must exist; otherwise `bookiki.toml` is used when
    /// present. Environment overrides are applied last, then validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            "Configuration loaded: image_url={}, report_url={}, led_ws_url={}",
            config.scanner.image_url, config.scanner.report_url, config.led.ws_url
        );
        Ok(config)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BOOKIKI_IMAGE_URL") {
            self.scanner.image_url = val;
        }
        if let Some(val) = lookup("BOOKIKI_REPORT_URL") {
            self.scanner.report_url = val;
        }
        if let Some(val) = lookup("BOOKIKI_SCAN_INTERVAL_SECS") {
            self.scanner.interval_secs = parse_env("BOOKIKI_SCAN_INTERVAL_SECS", &val)?;
        }
        if let Some(val) = lookup("YOLO_MODEL_PATH") {
            self.detector.model_path = val;
        }
        if let Some(val) = lookup("CLOVA_OCR_URL") {
            self.ocr.endpoint = Some(val);
        }
        if let Some(val) = lookup("CLOVA_OCR_SECRET") {
            self.ocr.secret = Some(val);
        }
        if let Some(val) = lookup("LED_WS_URL") {
            self.led.ws_url = val;
        }
        if let Some(val) = lookup("LED_SPI_DEVICE") {
            self.led.spi_device = Some(val).filter(|v| !v.is_empty());
        }
        if let Some(val) = lookup("LED_COUNT") {
            self.led.count = parse_env("LED_COUNT", &val)?;
        }
        if let Some(val) = lookup("LED_BRIGHTNESS") {
            self.led.brightness = parse_env("LED_BRIGHTNESS", &val)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("scanner.image_url", &self.scanner.image_url, &["http", "https"])?;
        check_url("scanner.report_url", &self.scanner.report_url, &["http", "https"])?;
        if let Some(endpoint) = &self.ocr.endpoint {
            check_url("ocr.endpoint", endpoint, &["http", "https"])?;
        }
        check_url("led.ws_url", &self.led.ws_url, &["ws", "wss"])?;
        check_url("demo.server_url", &self.demo.server_url, &["ws", "wss"])?;

        if self.scanner.shelf_groups == 0 {
            return Err(ConfigError::Invalid(
                "scanner.shelf_groups must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("detector.confidence_threshold", self.detector.confidence_threshold),
            ("detector.iou_threshold", self.detector.iou_threshold),
            ("led.brightness", self.led.brightness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.detector.input_size == 0 || self.detector.input_size % 32 != 0 {
            return Err(ConfigError::Invalid(format!(
                "detector.input_size must be a positive multiple of 32, got {}",
                self.detector.input_size
            )));
        }
        if self.led.count == 0 {
            return Err(ConfigError::Invalid("led.count must be at least 1".to_string()));
        }
        for shelf in &self.led.shelves {
            if shelf.start > shelf.end || shelf.end >= self.led.count {
                return Err(ConfigError::Invalid(format!(
                    "led range {}..={} for shelf {} does not fit a strip of {} LEDs",
                    shelf.start, shelf.end, shelf.shelf_id, self.led.count
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value '{}'", key, value)))
}

fn check_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::Invalid(format!("{} is not a valid URL ({}): {}", field, value, e)))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::Invalid(format!(
            "{} must use one of {:?}, got '{}'",
            field,
            schemes,
            parsed.scheme()
        )));
    }
    Ok(())
}
