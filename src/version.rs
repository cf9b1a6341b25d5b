// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Bookiki edge programs

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-shelf-scan-led-2025-02-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-02-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "yolo-spine-detection",
    "clova-ocr",
    "qr-labels",
    "shelf-grouping",
    "camera-error-report",
    "ws2812-spi",
    "iot-websocket",
    "led-demo",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Bookiki Edge {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
