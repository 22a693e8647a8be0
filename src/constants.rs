// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants and filesystem defaults

use std::path::PathBuf;

/// Default preview resolution (width)
///
/// Cameras that do not support this resolution in the configured preview
/// mode fail size negotiation; the executor then retries once in
/// [`crate::driver::PreviewMode::Yuyv`] before giving up.
pub const PREVIEW_WIDTH: u32 = 640;

/// Default preview resolution (height)
pub const PREVIEW_HEIGHT: u32 = 480;

/// JPEG quality used for still captures (0-100)
pub const JPEG_QUALITY: u8 = 100;

/// Subdirectory created under the pictures directory for captured stills
pub const CAPTURE_SUBDIR: &str = "camera";

/// Default directory for captured still images
///
/// Falls back to the home directory and then the current directory when the
/// XDG pictures directory is not available.
pub fn default_capture_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(CAPTURE_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capture_dir_ends_with_subdir() {
        let dir = default_capture_dir();
        assert!(dir.ends_with(CAPTURE_SUBDIR));
    }

    #[test]
    fn test_preview_defaults() {
        assert_eq!(PREVIEW_WIDTH, 640);
        assert_eq!(PREVIEW_HEIGHT, 480);
    }
}
