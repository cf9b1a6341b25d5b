// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scan report uploaded after each snapshot

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the status entry in [`ShelfBookItemsMap`]
pub const STATUS_KEY: u32 = 0;

/// Outcome code carried under key `"0"` of the shelf map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Ok,
    /// The snapshot could not be used; the server raises a camera alert
    CameraError,
}

impl ScanStatus {
    pub fn code(self) -> i64 {
        match self {
            ScanStatus::Ok => 0,
            ScanStatus::CameraError => 1,
        }
    }
}

/// Book item ids per shelf group, plus the scan status under key 0
///
/// Serialises as `{"0": [status], "1": [...], "2": [...], ...}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelfBookItemsMap(BTreeMap<u32, Vec<i64>>);

impl ShelfBookItemsMap {
    /// Build the map from groups ordered left to right; groups are numbered from 1
    pub fn from_groups(status: ScanStatus, groups: Vec<Vec<i64>>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(STATUS_KEY, vec![status.code()]);
        for (index, group) in groups.into_iter().enumerate() {
            map.insert(index as u32 + 1, group);
        }
        Self(map)
    }

    /// A map that only reports a status, every group empty
    pub fn status_only(status: ScanStatus, num_groups: usize) -> Self {
        Self::from_groups(status, vec![Vec::new(); num_groups])
    }

    pub fn status_code(&self) -> Option<i64> {
        self.0.get(&STATUS_KEY).and_then(|v| v.first().copied())
    }

    pub fn group(&self, shelf: u32) -> Option<&[i64]> {
        if shelf == STATUS_KEY {
            return None;
        }
        self.0.get(&shelf).map(Vec::as_slice)
    }

    pub fn num_groups(&self) -> usize {
        self.0.keys().filter(|k| **k != STATUS_KEY).count()
    }

    pub fn book_count(&self) -> usize {
        self.0
            .iter()
            .filter(|(k, _)| **k != STATUS_KEY)
            .map(|(_, ids)| ids.len())
            .sum()
    }
}

/// Body of the scan upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Concatenated spine text, one entry per spine that had any
    pub ocr_results: Vec<String>,
    pub shelf_book_items_map: ShelfBookItemsMap,
}

impl ScanReport {
    /// Report for a snapshot that could not be decoded
    pub fn camera_error(num_groups: usize) -> Self {
        Self {
            ocr_results: Vec::new(),
            shelf_book_items_map: ShelfBookItemsMap::status_only(ScanStatus::CameraError, num_groups),
        }
    }
}
