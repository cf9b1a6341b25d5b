// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EdgeConfig;
use crate::scanner::{self, HttpReportSink, ReportSink};
use crate::vision::image_utils::{decode_base64_image, decode_image_bytes, detect_format, DecodedImage};

/// Arguments for scan-once command
#[derive(Args, Debug)]
pub struct ScanOnceArgs {
    /// Image file: raw JPEG/PNG or a text file holding base64
    #[arg(long)]
    pub image: PathBuf,

    /// Print the report without uploading it
    #[arg(long)]
    pub no_upload: bool,
}

pub async fn run_scanner(config: &EdgeConfig, shutdown: CancellationToken) -> Result<()> {
    let runner = scanner::runner_from_config(config)?;
    runner.run(shutdown).await;
    Ok(())
}

pub async fn scan_once(config: &EdgeConfig, args: ScanOnceArgs) -> Result<()> {
    let decoded = load_image_file(&args.image)?;
    let pipeline = scanner::pipeline_from_config(config)?;

    let scan = pipeline.process_image(decoded).await?;
    println!("{}", serde_json::to_string_pretty(&scan.report)?);

    if args.no_upload {
        return Ok(());
    }

    let sink = HttpReportSink::new(config.scanner.report_url.clone(), config.scanner.request_timeout())?;
    let outcome = sink.upload(&scan.report).await?;
    info!("Upload outcome: {:?}", outcome);
    Ok(())
}

/// Load a local snapshot, accepting raw image bytes or base64 text
pub fn load_image_file(path: &Path) -> Result<DecodedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if detect_format(&bytes).is_ok() {
        return decode_image_bytes(bytes).with_context(|| format!("Failed to decode {}", path.display()));
    }

    let text = String::from_utf8(bytes).with_context(|| format!("{} is neither an image nor base64 text", path.display()))?;
    decode_base64_image(&text).with_context(|| format!("Failed to decode base64 in {}", path.display()))
}
