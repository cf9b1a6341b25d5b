// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-image vision results shared by the detector, QR scanner and grouping

use serde::Serialize;

/// Axis-aligned box in original image pixels, corners (x1, y1) - (x2, y2)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Smallest box enclosing all points; `None` for an empty slice
    pub fn enclosing(points: &[(f32, f32)]) -> Option<Self> {
        let (&(fx, fy), rest) = points.split_first()?;
        let init = Self::new(fx, fy, fx, fy);
        Some(rest.iter().fold(init, |b, &(x, y)| Self {
            x1: b.x1.min(x),
            y1: b.y1.min(y),
            x2: b.x2.max(x),
            y2: b.y2.max(y),
        }))
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True if `inner` lies fully inside this box (edges inclusive)
    pub fn contains(&self, inner: &BoundingBox) -> bool {
        inner.x1 >= self.x1 && inner.y1 >= self.y1 && inner.x2 <= self.x2 && inner.y2 <= self.y2
    }

    /// Intersection over union
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// A detected book spine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpineDetection {
    /// Index in detection order, starting at 0
    pub id: usize,
    pub bbox: BoundingBox,
    /// Detection confidence score (0.0-1.0)
    pub confidence: f32,
    pub label: String,
}

/// A decoded QR code label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedQr {
    pub payload: String,
    pub bbox: BoundingBox,
}
