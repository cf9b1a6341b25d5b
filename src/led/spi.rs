// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! SPI device access for the strip

use tracing::info;

use super::driver::{LogDriver, PixelDriver};
use super::LedError;

#[cfg(target_os = "linux")]
pub use linux::{open_spidev, SpidevBus};

#[cfg(target_os = "linux")]
mod linux {
    use spidev::{SpiModeFlags, Spidev, SpidevOptions};

    use crate::led::driver::{Ws2812Spi, WS2812_SPI_HZ};
    use crate::led::LedError;

    /// WS2812 driver writing to a Linux spidev node
    pub type SpidevBus = Ws2812Spi<Spidev>;

    pub fn open_spidev(path: &str) -> Result<SpidevBus, LedError> {
        let mut spi = Spidev::open(path)?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(WS2812_SPI_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options)?;
        Ok(Ws2812Spi::new(spi))
    }
}

/// Pick the driver for the configured device; no device means log only
pub fn open_driver(spi_device: Option<&str>) -> Result<Box<dyn PixelDriver>, LedError> {
    match spi_device {
        None => {
            info!("No SPI device configured, LED frames will only be logged");
            Ok(Box::new(LogDriver))
        }
        Some(path) => open_hardware(path),
    }
}

#[cfg(target_os = "linux")]
fn open_hardware(path: &str) -> Result<Box<dyn PixelDriver>, LedError> {
    let bus = open_spidev(path)?;
    info!("Opened LED strip on {}", path);
    Ok(Box::new(bus))
}

#[cfg(not(target_os = "linux"))]
fn open_hardware(_path: &str) -> Result<Box<dyn PixelDriver>, LedError> {
    Err(LedError::Unsupported)
}
