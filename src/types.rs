// SPDX-License-Identifier: GPL-3.0-only

//! Shared frame types

use crate::error::{CameraError, Result};
use std::sync::Arc;

/// Pixel layout of a delivered frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 16-bit packed RGB, little-endian (5 red, 6 green, 5 blue)
    #[default]
    Rgb565,
    /// 24-bit RGB, one byte per channel
    Rgb24,
}

impl PixelFormat {
    /// Bytes per pixel for this format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb24 => 3,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Rgb565 => write!(f, "RGB565"),
            PixelFormat::Rgb24 => write!(f, "RGB24"),
        }
    }
}

/// A single video frame as delivered by the driver's callback thread
///
/// Pixel data is reference counted so a frame can be handed to the still
/// capture path without copying.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
}

impl CameraFrame {
    /// Expected buffer length for the declared dimensions and format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Pixel data as tightly packed RGB24 bytes
    ///
    /// Returns an error when the buffer length does not match the declared
    /// dimensions, so malformed driver buffers cannot panic the delivery
    /// thread further down the encoding path.
    pub fn to_rgb24(&self) -> Result<Vec<u8>> {
        if self.data.len() != self.expected_len() {
            return Err(CameraError::InvalidFrame(format!(
                "{}x{} {} frame has {} bytes, expected {}",
                self.width,
                self.height,
                self.format,
                self.data.len(),
                self.expected_len()
            )));
        }
        match self.format {
            PixelFormat::Rgb24 => Ok(self.data.to_vec()),
            PixelFormat::Rgb565 => Ok(rgb565_to_rgb24(&self.data)),
        }
    }
}

/// Expand little-endian RGB565 pixels to RGB24
///
/// Each channel is scaled to 8 bits by replicating its high bits into the
/// low bits, matching the usual 565 dequantization.
fn rgb565_to_rgb24(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 * 3);
    for px in data.chunks_exact(2) {
        let v = u16::from_le_bytes([px[0], px[1]]);
        let r = ((v >> 11) & 0x1f) as u8;
        let g = ((v >> 5) & 0x3f) as u8;
        let b = (v & 0x1f) as u8;
        out.push((r << 3) | (r >> 2));
        out.push((g << 2) | (g >> 4));
        out.push((b << 3) | (b >> 2));
    }
    out
}
