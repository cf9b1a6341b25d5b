// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pixel buffer for the strip; nothing reaches the LEDs until `show`

use super::color::{ColorOrder, Rgb};
use super::driver::PixelDriver;
use super::LedError;

pub struct LedStrip {
    pixels: Vec<Rgb>,
    brightness: f32,
    order: ColorOrder,
    driver: Box<dyn PixelDriver>,
}

impl LedStrip {
    pub fn new(
        count: usize,
        brightness: f32,
        order: ColorOrder,
        driver: Box<dyn PixelDriver>,
    ) -> Self {
        Self {
            pixels: vec![Rgb::OFF; count],
            brightness: brightness.clamp(0.0, 1.0),
            order,
            driver,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    pub fn set(&mut self, index: usize, color: Rgb) -> Result<(), LedError> {
        let count = self.pixels.len();
        let px = self
            .pixels
            .get_mut(index)
            .ok_or(LedError::IndexOutOfRange { index, count })?;
        *px = color;
        Ok(())
    }

    /// Render the buffer with brightness applied and push it to the driver
    pub fn show(&mut self) -> Result<(), LedError> {
        let frame = self.render();
        self.driver.write(&frame)
    }

    pub fn render(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| c.scaled(self.brightness).to_wire(self.order))
            .collect()
    }
}
