// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use bookiki_edge::config::{ConfigError, EdgeConfig};
use bookiki_edge::led::{ColorOrder, Rgb};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_file() {
    let file = write_config(
        r#"
        [scanner]
        image_url = "http://10.0.0.2:8088/api/iot-storage"
        report_url = "http://10.0.0.2:8088/api/books/return/scan"
        interval_secs = 30
        report_camera_errors = true

        [detector]
        model_path = "/opt/models/yolov8m.onnx"
        confidence_threshold = 0.6

        [ocr]
        endpoint = "https://ocr.example.com/custom/v1/general"
        secret = "abc"

        [led]
        ws_url = "wss://library.example.com/iot/ws"
        spi_device = "/dev/spidev0.0"
        count = 12
        color_order = "rgb"
        hold_secs = 3

        [[led.shelves]]
        shelf_id = 1
        start = 0
        end = 5
        color = [255, 128, 0]

        [[led.shelves]]
        shelf_id = 2
        start = 6
        end = 11
        color = [0, 0, 255]

        [demo]
        listen_addr = "0.0.0.0:8765"
        "#,
    );

    let config = EdgeConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.scanner.interval(), Duration::from_secs(30));
    assert!(config.scanner.report_camera_errors);
    assert_eq!(config.detector.confidence_threshold, 0.6);
    assert_eq!(config.detector.iou_threshold, 0.4);
    assert_eq!(config.ocr.secret.as_deref(), Some("abc"));
    assert_eq!(config.led.count, 12);
    assert_eq!(config.led.color_order, ColorOrder::Rgb);
    assert_eq!(config.led.hold(), Duration::from_secs(3));
    assert_eq!(config.led.shelves.len(), 2);
    assert_eq!(config.led.shelves[0].color, Rgb::new(255, 128, 0));
    assert_eq!(config.demo.listen_addr, "0.0.0.0:8765");
    assert_eq!(config.demo.server_url, "ws://localhost:8765");
}

#[test]
fn test_shelf_range_past_strip_is_rejected() {
    let file = write_config(
        r#"
        [led]
        count = 10

        [[led.shelves]]
        shelf_id = 1
        start = 0
        end = 10
        color = [255, 0, 0]
        "#,
    );

    let config = EdgeConfig::from_file(file.path()).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_config("[scanner\ninterval_secs = ");
    assert!(matches!(EdgeConfig::from_file(file.path()), Err(ConfigError::Parse(_))));
}
