// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! QR code decoding of the labels stuck on book spines

use image::DynamicImage;
use tracing::{debug, trace};

use super::model::{BoundingBox, DecodedQr};

/// Anything that can find and decode QR labels in a snapshot
pub trait QrScanner: Send + Sync {
    fn scan(&self, image: &DynamicImage) -> Vec<DecodedQr>;
}

/// QR scanner backed by `rqrr`
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrScanner;

impl RqrrScanner {
    pub fn new() -> Self {
        Self
    }
}

impl QrScanner for RqrrScanner {
    fn scan(&self, image: &DynamicImage) -> Vec<DecodedQr> {
        let start = std::time::Instant::now();
        let gray = image.to_luma8();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        trace!(count = grids.len(), "QR grids located");

        let mut codes = Vec::with_capacity(grids.len());
        for grid in grids {
            let corners: Vec<(f32, f32)> = grid
                .bounds
                .iter()
                .map(|p| (p.x as f32, p.y as f32))
                .collect();

            let mut payload = Vec::new();
            if let Err(e) = grid.decode_to(&mut payload) {
                debug!(error = %e, "Failed to decode QR grid");
                continue;
            }

            let Some(bbox) = BoundingBox::enclosing(&corners) else {
                continue;
            };

            codes.push(DecodedQr {
                payload: String::from_utf8_lossy(&payload).into_owned(),
                bbox,
            });
        }

        debug!(
            count = codes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "QR decoding complete"
        );
        codes
    }
}
