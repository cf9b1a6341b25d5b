// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shelf-level lighting on top of the strip

use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::color::Rgb;
use super::driver::PixelDriver;
use super::strip::LedStrip;
use super::LedError;
use crate::config::{LedConfig, ShelfLight};

pub struct ShelfLightController {
    strip: LedStrip,
    shelves: Vec<ShelfLight>,
    hold: Duration,
    settle: Duration,
    interrupt: CancellationToken,
}

impl ShelfLightController {
    pub fn new(strip: LedStrip, shelves: Vec<ShelfLight>, hold: Duration, settle: Duration) -> Self {
        Self {
            strip,
            shelves,
            hold,
            settle,
            interrupt: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &LedConfig, driver: Box<dyn PixelDriver>) -> Self {
        let strip = LedStrip::new(config.count, config.brightness, config.color_order, driver);
        Self::new(strip, config.shelves.clone(), config.hold(), config.settle())
    }

    /// Cut holds and settles short once `token` fires
    pub fn interrupt_on(&mut self, token: CancellationToken) {
        self.interrupt = token;
    }

    pub fn strip(&self) -> &LedStrip {
        &self.strip
    }

    /// Light `start..=end` in `color`, hold, then switch everything off.
    /// An invalid range is logged and ignored.
    pub async fn light_range(&mut self, start: usize, end: usize, color: Rgb) -> Result<(), LedError> {
        if start > end || end >= self.strip.len() {
            warn!(
                "Invalid LED range {}..={} for a strip of {}",
                start,
                end,
                self.strip.len()
            );
            return Ok(());
        }

        self.strip.fill(Rgb::OFF);
        for index in start..=end {
            self.strip.set(index, color)?;
        }
        self.strip.show()?;
        info!("LEDs {}..={} on", start, end);

        self.wait(self.hold).await;
        self.turn_off().await
    }

    /// Light the range configured for `shelf_id`; unknown ids are logged
    pub async fn light_shelf(&mut self, shelf_id: i64) -> Result<(), LedError> {
        let Some(shelf) = self.shelves.iter().find(|s| s.shelf_id == shelf_id).cloned() else {
            warn!("Invalid shelf id: {}", shelf_id);
            return Ok(());
        };
        info!("Lighting shelf {}", shelf_id);
        self.light_range(shelf.start, shelf.end, shelf.color).await
    }

    /// Light exactly one LED and leave it on
    pub fn light_single(&mut self, index: usize, color: Rgb) -> Result<(), LedError> {
        self.strip.fill(Rgb::OFF);
        self.strip.set(index, color)?;
        self.strip.show()
    }

    pub async fn turn_off(&mut self) -> Result<(), LedError> {
        self.strip.fill(Rgb::OFF);
        self.strip.show()?;
        debug!("LEDs off");
        self.wait(self.settle).await;
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        tokio::select! {
            _ = self.interrupt.cancelled() => debug!("LED wait interrupted"),
            _ = sleep(duration) => {}
        }
    }
}
