// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Colours and wire byte order for WS2812 pixels

use serde::{Deserialize, Serialize};

/// 24-bit colour; written as `[r, g, b]` in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `brightness` (clamped to [0, 1]), truncating
    pub fn scaled(self, brightness: f32) -> Self {
        let k = brightness.clamp(0.0, 1.0);
        let scale = |v: u8| (v as f32 * k) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Bytes in the order the strip expects them
    pub fn to_wire(self, order: ColorOrder) -> [u8; 3] {
        match order {
            ColorOrder::Rgb => [self.r, self.g, self.b],
            ColorOrder::Grb => [self.g, self.r, self.b],
        }
    }

    /// HSV to RGB with all components in [0, 1]; channels are truncated
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let (r, g, b) = if s == 0.0 {
            (v, v, v)
        } else {
            let sector = (h * 6.0).floor();
            let f = h * 6.0 - sector;
            let p = v * (1.0 - s);
            let q = v * (1.0 - s * f);
            let t = v * (1.0 - s * (1.0 - f));
            match (sector as i64).rem_euclid(6) {
                0 => (v, t, p),
                1 => (q, v, p),
                2 => (p, v, t),
                3 => (p, q, v),
                4 => (t, p, v),
                _ => (v, p, q),
            }
        };
        let to_u8 = |c: f32| (c * 255.0) as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

/// Channel order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    Rgb,
    #[default]
    Grb,
}

/// One colour per LED, hue stepping evenly around the wheel
pub fn rainbow(count: usize) -> Vec<Rgb> {
    (0..count)
        .map(|i| Rgb::from_hsv(i as f32 / count as f32, 1.0, 1.0))
        .collect()
}
