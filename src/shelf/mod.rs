// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shelf grouping
//!
//! Turns the per-image detections into the scan report:
//! - OCR text is attached to the spines that contain it
//! - QR labels are attached to their spine, sorted left to right and
//!   split evenly into shelf groups

pub mod grouping;
pub mod report;

pub use grouping::{
    assign_qr_to_spines, extract_qr_id, group_ocr_by_spine, parse_book_ids, sort_left_to_right,
    spine_texts, split_into_groups, SpineQr,
};
pub use report::{ScanReport, ScanStatus, ShelfBookItemsMap};

use crate::ocr::OcrBox;
use crate::vision::{DecodedQr, SpineDetection};

/// Default number of shelf groups on one scanned shelf
pub const DEFAULT_SHELF_GROUPS: usize = 3;

/// Report plus the intermediate placement, kept for logging
#[derive(Debug, Clone)]
pub struct ShelfScan {
    pub report: ScanReport,
    /// QR labels placed on spines, left to right
    pub placed_qrs: Vec<SpineQr>,
}

/// Build the scan report for one snapshot
pub fn build_report(
    spines: &[SpineDetection],
    ocr_boxes: &[OcrBox],
    qrs: &[DecodedQr],
    num_groups: usize,
) -> ShelfScan {
    let texts = spine_texts(&group_ocr_by_spine(ocr_boxes, spines));

    let mut placed_qrs = assign_qr_to_spines(qrs, spines);
    sort_left_to_right(&mut placed_qrs);

    let book_ids = parse_book_ids(&placed_qrs);
    let groups = split_into_groups(&book_ids, num_groups);

    ShelfScan {
        report: ScanReport {
            ocr_results: texts,
            shelf_book_items_map: ShelfBookItemsMap::from_groups(ScanStatus::Ok, groups),
        },
        placed_qrs,
    }
}
