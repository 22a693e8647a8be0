// SPDX-License-Identifier: GPL-3.0-only

//! Error types for camera command execution

use std::fmt;

/// Result type alias using CameraError
pub type Result<T> = std::result::Result<T, CameraError>;

/// Errors surfaced by the driver, the frame sink, and executor startup
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Driver failed to open the device handle
    OpenFailed(String),
    /// Requested preview size/mode is not supported by the device
    FormatNotSupported(String),
    /// Preview could not be started on an open device
    PreviewFailed(String),
    /// Frame buffer does not match its declared dimensions/format
    InvalidFrame(String),
    /// Still image encoding failed
    EncodingFailed(String),
    /// Executor thread could not be spawned or died before publishing
    ExecutorStartup(String),
    /// Storage/filesystem error
    Io(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            CameraError::PreviewFailed(msg) => write!(f, "Failed to start preview: {}", msg),
            CameraError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            CameraError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            CameraError::ExecutorStartup(msg) => write!(f, "Executor startup failed: {}", msg),
            CameraError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Io(err.to_string())
    }
}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::EncodingFailed(err.to_string())
    }
}
