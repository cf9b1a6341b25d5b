// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spatial grouping of OCR text and QR labels by detected spine

use std::collections::BTreeMap;
use tracing::warn;

use crate::ocr::OcrBox;
use crate::vision::{BoundingBox, DecodedQr, SpineDetection};

/// A QR label placed on a spine
#[derive(Debug, Clone, PartialEq)]
pub struct SpineQr {
    pub spine_id: usize,
    pub qr_id: String,
    pub bbox: BoundingBox,
}

/// Book id carried by a QR payload: the last `/` segment of the URL
///
/// `http://host/books/21` yields `21`; a payload without `/` is returned whole.
pub fn extract_qr_id(payload: &str) -> &str {
    payload.rsplit('/').next().unwrap_or(payload)
}

/// Collect OCR texts per spine, keyed by spine id
///
/// A text box is attached to every spine that fully contains it, in OCR order.
pub fn group_ocr_by_spine(
    ocr_boxes: &[OcrBox],
    spines: &[SpineDetection],
) -> BTreeMap<usize, Vec<String>> {
    let mut by_spine: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for ocr in ocr_boxes {
        for spine in spines.iter().filter(|s| s.bbox.contains(&ocr.bbox)) {
            by_spine.entry(spine.id).or_default().push(ocr.text.clone());
        }
    }

    by_spine
}

/// One line of text per spine that has any, in ascending spine id order
pub fn spine_texts(by_spine: &BTreeMap<usize, Vec<String>>) -> Vec<String> {
    by_spine.values().map(|texts| texts.join(" ")).collect()
}

/// Attach every QR label to each spine that fully contains it
///
/// Overlapping spines each get their own copy of the label, in QR order then
/// spine order. Labels outside every spine are dropped.
pub fn assign_qr_to_spines(qrs: &[DecodedQr], spines: &[SpineDetection]) -> Vec<SpineQr> {
    qrs.iter()
        .flat_map(|qr| {
            spines
                .iter()
                .filter(|spine| spine.bbox.contains(&qr.bbox))
                .map(|spine| SpineQr {
                    spine_id: spine.id,
                    qr_id: extract_qr_id(&qr.payload).to_string(),
                    bbox: qr.bbox,
                })
        })
        .collect()
}

/// Order labels left to right; ties keep their input order
pub fn sort_left_to_right(qrs: &mut [SpineQr]) {
    qrs.sort_by(|a, b| a.bbox.x1.total_cmp(&b.bbox.x1));
}

/// Parse the numeric book ids, skipping labels that are not numbers
pub fn parse_book_ids(qrs: &[SpineQr]) -> Vec<i64> {
    qrs.iter()
        .filter_map(|qr| match qr.qr_id.trim().parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(qr_id = %qr.qr_id, spine_id = qr.spine_id, "QR label is not a numeric book id, skipping");
                None
            }
        })
        .collect()
}

/// Split items into `num_groups` consecutive chunks of near-equal size
///
/// Every chunk gets `len / num_groups` items and the first `len % num_groups`
/// chunks get one more.
pub fn split_into_groups<T: Clone>(items: &[T], num_groups: usize) -> Vec<Vec<T>> {
    if num_groups == 0 {
        return Vec::new();
    }

    let base = items.len() / num_groups;
    let remainder = items.len() % num_groups;

    let mut groups = Vec::with_capacity(num_groups);
    let mut start = 0;
    for i in 0..num_groups {
        let size = base + usize::from(i < remainder);
        groups.push(items[start..start + size].to_vec());
        start += size;
    }

    groups
}
