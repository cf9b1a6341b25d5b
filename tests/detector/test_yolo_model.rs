// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runs against a real YOLOv8 export; set YOLO_MODEL_PATH and SHELF_IMAGE_PATH

use bookiki_edge::config::DetectorConfig;
use bookiki_edge::vision::{QrScanner, RqrrScanner, SpineDetector, YoloSpineDetector};

fn detector_config() -> DetectorConfig {
    DetectorConfig {
        model_path: std::env::var("YOLO_MODEL_PATH")
            .unwrap_or_else(|_| DetectorConfig::default().model_path),
        ..DetectorConfig::default()
    }
}

#[test]
fn test_missing_model_reports_path() {
    let config = DetectorConfig {
        model_path: "/nonexistent/yolov8m.onnx".to_string(),
        ..DetectorConfig::default()
    };
    let err = YoloSpineDetector::new(&config).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
#[ignore = "requires a YOLOv8 ONNX model"]
fn test_blank_image_has_no_spines() {
    let detector = YoloSpineDetector::new(&detector_config()).unwrap();
    let blank = image::DynamicImage::new_rgb8(640, 480);
    assert!(detector.detect(&blank).unwrap().is_empty());
}

#[test]
#[ignore = "requires a YOLOv8 ONNX model and a shelf photo"]
fn test_shelf_photo_yields_spines() {
    let path = std::env::var("SHELF_IMAGE_PATH").expect("SHELF_IMAGE_PATH not set");
    let photo = image::open(&path).unwrap();
    let detector = YoloSpineDetector::new(&detector_config()).unwrap();

    let spines = detector.detect(&photo).unwrap();
    assert!(!spines.is_empty());
    for (i, spine) in spines.iter().enumerate() {
        assert_eq!(spine.id, i);
        assert_eq!(spine.label, "book");
        assert!(spine.confidence >= 0.5);
        assert!(spine.bbox.x2 <= photo.width() as f32 && spine.bbox.y2 <= photo.height() as f32);
    }

    // Labels are optional on a photo, but any found must carry a payload
    for qr in RqrrScanner::new().scan(&photo) {
        assert!(!qr.payload.is_empty());
    }
}
