// SPDX-License-Identifier: GPL-3.0-only

//! Camera configuration

use crate::constants;
use crate::driver::PreviewMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings applied when a preview is started or a still is captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Preview resolution width
    pub preview_width: u32,
    /// Preview resolution height
    pub preview_height: u32,
    /// Preferred preview mode; negotiation falls back to YUYV once
    pub preview_mode: PreviewMode,
    /// JPEG quality for captured stills (0-100)
    pub jpeg_quality: u8,
    /// Directory captured stills are written to
    pub capture_dir: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            preview_width: constants::PREVIEW_WIDTH,
            preview_height: constants::PREVIEW_HEIGHT,
            preview_mode: PreviewMode::Mjpeg,
            jpeg_quality: constants::JPEG_QUALITY,
            capture_dir: constants::default_capture_dir(),
        }
    }
}
