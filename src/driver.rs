// SPDX-License-Identifier: GPL-3.0-only

//! External collaborator seams
//!
//! The camera driver, the media indexer, and the shutter sound are thin I/O
//! wrappers owned by the host application. They are modeled as traits so the
//! executor can be driven against scripted implementations in tests.

use crate::error::Result;
use crate::sink::FrameSink;
use crate::types::PixelFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Device-control handle produced by the host's device monitor
///
/// Identifies which physical device an `Open` command should attach to. The
/// executor never interprets it, only passes it to [`CameraDriver::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlHandle {
    pub device_name: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Render target for preview frames
///
/// Owned by the caller; the executor only references it between
/// `StartPreview` and the stop-preview rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub surface_id: u64,
}

/// Preview pixel transfer mode negotiated with the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreviewMode {
    /// Uncompressed YUV 4:2:2 — the fallback every UVC device supports
    #[default]
    Yuyv,
    /// Motion JPEG — higher resolutions on limited USB bandwidth
    Mjpeg,
}

impl std::fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewMode::Yuyv => write!(f, "YUYV"),
            PreviewMode::Mjpeg => write!(f, "MJPEG"),
        }
    }
}

/// One open camera device
///
/// The executor thread is the only caller; implementations do not need
/// internal locking. `set_preview_size` fails with
/// [`crate::error::CameraError::FormatNotSupported`] when the device cannot
/// produce the requested size in the requested mode.
pub trait CameraDriver: Send {
    fn open(&mut self, ctrl: &ControlHandle) -> Result<()>;
    fn close(&mut self);
    fn set_preview_size(&mut self, width: u32, height: u32, mode: PreviewMode) -> Result<()>;
    /// Register the sink invoked once per frame on the driver's own thread
    fn set_frame_callback(&mut self, sink: Arc<FrameSink>, format: PixelFormat);
    fn set_preview_display(&mut self, target: &RenderTarget);
    fn start_preview(&mut self) -> Result<()>;
    fn stop_preview(&mut self);
    fn destroy(&mut self);
}

/// Produces a fresh driver instance for each `Open` command
pub type DriverFactory = Box<dyn FnMut() -> Box<dyn CameraDriver> + Send>;

/// Media index notification, best-effort
///
/// The executor holds this through a `Weak` reference; when the owning
/// context is gone the notification is skipped and the camera released.
pub trait MediaIndexer: Send + Sync {
    fn file_created(&self, path: &Path);
}

/// Shutter sound played when a still capture fires, best-effort
pub trait ShutterSound: Send + Sync {
    fn play(&self);
}
