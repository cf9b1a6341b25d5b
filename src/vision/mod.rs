// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local vision processing for shelf snapshots
//!
//! This module provides:
//! - Snapshot decoding (base64 / raw bytes)
//! - Book spine detection via a YOLOv8 ONNX export
//! - QR label decoding
//!
//! Detection runs on CPU only; the edge box has no GPU.

pub mod detection;
pub mod image_utils;
pub mod model;
pub mod preprocessing;
pub mod qr;

pub use detection::{SpineDetector, YoloSpineDetector};
pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, format_to_extension, DecodedImage,
    ImageError, ImageInfo,
};
pub use model::{BoundingBox, DecodedQr, SpineDetection};
pub use qr::{QrScanner, RqrrScanner};
