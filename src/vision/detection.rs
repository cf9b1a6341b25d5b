// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 book spine detection
//!
//! Runs an Ultralytics YOLOv8 ONNX export on CPU and keeps only the boxes
//! whose best class is the configured label (`book` by default).

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::model::{BoundingBox, SpineDetection};
use super::preprocessing::{preprocess_for_detection, PreprocessInfo};
use crate::config::DetectorConfig;

/// COCO class names in YOLOv8 output order
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Anything that can find book spines in a snapshot
pub trait SpineDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<SpineDetection>>;
}

/// A candidate box in model input space, before NMS
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub confidence: f32,
}

/// Thresholds applied when decoding detector output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    pub confidence: f32,
    pub iou: f32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            iou: 0.4,
        }
    }
}

/// Resolve a class name to its COCO index
pub fn class_id_for_label(label: &str) -> Option<usize> {
    COCO_LABELS.iter().position(|name| *name == label)
}

/// Decode a YOLOv8 output tensor of shape [1, 4 + C, N]
///
/// Rows 0..4 hold (cx, cy, w, h) in input pixels, the remaining rows hold
/// one score per class. A candidate is kept when its best class is
/// `target_class` and that score reaches the confidence threshold.
pub fn decode_yolo_output(
    output: ArrayViewD<f32>,
    target_class: usize,
    confidence_threshold: f32,
) -> Result<Vec<RawDetection>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .context("Unexpected detector output rank, expected [1, 4 + C, N]")?;

    let (batch, rows, num_boxes) = output.dim();
    if batch != 1 || rows <= 4 {
        anyhow::bail!(
            "Unexpected detector output shape: [{}, {}, {}]",
            batch,
            rows,
            num_boxes
        );
    }
    let num_classes = rows - 4;
    if target_class >= num_classes {
        anyhow::bail!(
            "Target class {} outside model range ({} classes)",
            target_class,
            num_classes
        );
    }

    let mut detections = Vec::new();
    for i in 0..num_boxes {
        let mut best_class = 0;
        let mut best_score = f32::MIN;
        for c in 0..num_classes {
            let score = output[[0, 4 + c, i]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_class != target_class || best_score < confidence_threshold {
            continue;
        }

        let cx = output[[0, 0, i]];
        let cy = output[[0, 1, i]];
        let w = output[[0, 2, i]];
        let h = output[[0, 3, i]];

        detections.push(RawDetection {
            bbox: BoundingBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0),
            class_id: best_class,
            confidence: best_score,
        });
    }

    Ok(detections)
}

/// Non-Maximum Suppression, highest confidence first
pub fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = keep
            .iter()
            .any(|kept| kept.class_id == candidate.class_id && kept.bbox.iou(&candidate.bbox) > iou_threshold);
        if !suppressed {
            keep.push(candidate);
        }
    }

    keep
}

/// Map surviving candidates back to the original image and number them
pub fn finalize_detections(
    detections: Vec<RawDetection>,
    info: &PreprocessInfo,
    label: &str,
) -> Vec<SpineDetection> {
    detections
        .into_iter()
        .enumerate()
        .map(|(id, det)| {
            let (x1, y1) = info.map_to_original(det.bbox.x1, det.bbox.y1);
            let (x2, y2) = info.map_to_original(det.bbox.x2, det.bbox.y2);
            SpineDetection {
                id,
                bbox: BoundingBox::new(x1, y1, x2, y2),
                confidence: det.confidence,
                label: label.to_string(),
            }
        })
        .collect()
}

/// YOLOv8 spine detector backed by ONNX Runtime
#[derive(Clone)]
pub struct YoloSpineDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
    label: String,
    class_id: usize,
    thresholds: DetectionThresholds,
}

impl std::fmt::Debug for YoloSpineDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloSpineDetector")
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("label", &self.label)
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

impl YoloSpineDetector {
    /// Load the detector from a YOLOv8 ONNX export
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - The configured label is not a COCO class
    /// - ONNX Runtime initialization fails
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let model_path = Path::new(&config.model_path);

        if !model_path.exists() {
            anyhow::bail!("Spine detection model not found: {}", model_path.display());
        }

        let class_id = class_id_for_label(&config.label)
            .with_context(|| format!("Unknown detection label '{}'", config.label))?;

        info!("Loading spine detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load spine detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!("Spine detection model input: {}", input_name);
        info!("✅ Spine detection model loaded (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size: config.input_size,
            label: config.label.clone(),
            class_id,
            thresholds: DetectionThresholds {
                confidence: config.confidence_threshold.clamp(0.0, 1.0),
                iou: config.iou_threshold.clamp(0.0, 1.0),
            },
        })
    }

    pub fn thresholds(&self) -> DetectionThresholds {
        self.thresholds
    }
}

impl SpineDetector for YoloSpineDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<SpineDetection>> {
        let info = PreprocessInfo::new(image, self.input_size);
        let input = preprocess_for_detection(image, self.input_size);

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let candidates = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("Spine detection session lock poisoned"))?;

            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Spine detection inference failed")?;

            let output_tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;

            debug!("Detection output shape: {:?}", output_tensor.shape());

            decode_yolo_output(output_tensor.view(), self.class_id, self.thresholds.confidence)?
        };

        let kept = non_max_suppression(candidates, self.thresholds.iou);
        let spines = finalize_detections(kept, &info, &self.label);

        debug!("Detected {} spines", spines.len());
        Ok(spines)
    }
}
