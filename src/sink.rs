// SPDX-License-Identifier: GPL-3.0-only

//! Frame sink — still capture on the driver's delivery thread
//!
//! The driver invokes [`FrameSink::on_frame`] once per frame on its own
//! thread. The common case is a single atomic load and return, since this
//! sits on the latency-critical preview path. When a capture is pending the
//! frame is encoded and written synchronously, and a `MediaUpdated` command
//! is fed back into the queue. Nothing in here may panic into the driver
//! thread; a fault there would abort frame delivery entirely.

use crate::command::{Command, CommandQueue};
use crate::config::CameraConfig;
use crate::driver::ShutterSound;
use crate::error::Result;
use crate::types::CameraFrame;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Per-frame callback target shared between the executor and the driver
pub struct FrameSink {
    /// True between a `CaptureStill` command and the next delivered frame
    capture_pending: AtomicBool,
    jpeg_quality: u8,
    capture_dir: PathBuf,
    shutter: Option<Arc<dyn ShutterSound>>,
    queue: CommandQueue,
}

impl FrameSink {
    pub(crate) fn new(
        config: &CameraConfig,
        queue: CommandQueue,
        shutter: Option<Arc<dyn ShutterSound>>,
    ) -> Self {
        Self {
            capture_pending: AtomicBool::new(false),
            jpeg_quality: config.jpeg_quality,
            capture_dir: config.capture_dir.clone(),
            shutter,
            queue,
        }
    }

    /// Arm the capture flag: the next delivered frame is persisted
    pub(crate) fn request_capture(&self) {
        self.capture_pending.store(true, Ordering::Release);
    }

    pub(crate) fn capture_pending(&self) -> bool {
        self.capture_pending.load(Ordering::Acquire)
    }

    /// Handle one delivered frame
    ///
    /// Called by the driver on its delivery thread, possibly while the
    /// executor is processing unrelated commands. The swap both claims the
    /// pending capture and clears the flag, so a frame is persisted at most
    /// once per `CaptureStill` even if the executor re-arms concurrently.
    /// Encoding failures are logged and swallowed; the flag stays cleared so
    /// no permanent capture-stuck state can result.
    pub fn on_frame(&self, frame: &CameraFrame) {
        if !self.capture_pending.load(Ordering::Acquire) {
            return;
        }
        if !self.capture_pending.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(shutter) = &self.shutter {
            shutter.play();
        }

        match self.encode_and_save(frame) {
            Ok(path) => {
                info!(path = %path.display(), "Still image saved");
                if !self.queue.submit(Command::MediaUpdated(path)) {
                    warn!("Executor gone, media update not delivered");
                }
            }
            Err(e) => {
                error!(error = %e, "Still capture failed");
            }
        }
    }

    /// Encode the frame as JPEG and write it under the capture directory,
    /// named by millisecond timestamp
    fn encode_and_save(&self, frame: &CameraFrame) -> Result<PathBuf> {
        let rgb = frame.to_rgb24()?;

        let mut encoded = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut encoded);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, self.jpeg_quality);
        encoder.encode(
            &rgb,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        )?;
        debug!(size = encoded.len(), "Still image encoded");

        std::fs::create_dir_all(&self.capture_dir)?;
        let filename = format!("{}.jpg", chrono::Local::now().timestamp_millis());
        let path = self.capture_dir.join(filename);
        std::fs::write(&path, &encoded)?;
        Ok(path)
    }
}
