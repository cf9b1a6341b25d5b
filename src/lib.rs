// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod led;
pub mod ocr;
pub mod scanner;
pub mod shelf;
pub mod version;
pub mod vision;

pub use config::EdgeConfig;
pub use scanner::{ScanPipeline, ScanRunner};
pub use shelf::{ScanReport, ShelfBookItemsMap};
