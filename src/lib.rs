// SPDX-License-Identifier: GPL-3.0-only

//! uvc-camera — sequential command executor for a single UVC camera device
//!
//! Device-lifecycle operations (open, configure, start/stop preview,
//! capture) execute strictly sequentially on one dedicated executor thread,
//! while raw frames arrive asynchronously on the driver's own delivery
//! thread. The crate is organized into:
//!
//! - [`handler`]: the command-facing API ([`CameraHandler`])
//! - `executor`: the worker thread owning the device session
//! - [`command`]: the ordered command mailbox between the two
//! - [`sink`]: the per-frame callback handling one-shot still capture
//! - [`driver`]: traits for the external collaborators (driver, indexer,
//!   shutter sound)
//!
//! # Example
//!
//! ```ignore
//! let handler = CameraHandler::create(factory, indexer, None, CameraConfig::default())?;
//! handler.open(ctrl_handle);
//! handler.start_preview(render_target);
//! handler.capture_still();
//! handler.stop_preview_and_wait();
//! handler.close();
//! ```

pub mod command;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod handler;
pub mod sink;
pub mod types;

mod executor;

// Re-export commonly used types
pub use config::CameraConfig;
pub use driver::{
    CameraDriver, ControlHandle, DriverFactory, MediaIndexer, PreviewMode, RenderTarget,
    ShutterSound,
};
pub use error::{CameraError, Result};
pub use handler::CameraHandler;
pub use sink::FrameSink;
pub use types::{CameraFrame, PixelFormat};
