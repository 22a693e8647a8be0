// SPDX-License-Identifier: GPL-3.0-only

//! Command-facing handle for the camera executor
//!
//! A `CameraHandler` is the only way the rest of the application talks to
//! the executor thread. Every method is fire-and-forget except
//! [`CameraHandler::stop_preview_and_wait`] and [`CameraHandler::close`],
//! which block until preview has actually stopped — required before the
//! caller may release or replace the render target.

use crate::command::{Command, CommandQueue};
use crate::config::CameraConfig;
use crate::driver::{ControlHandle, DriverFactory, MediaIndexer, RenderTarget, ShutterSound};
use crate::error::Result;
use crate::executor::{self, SharedState};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

/// Handle submitting commands to the executor thread
///
/// Cheap to clone; clones share the same executor and state. There are no
/// synchronous error returns from capture or preview start: failures are
/// observable through [`CameraHandler::is_open`] and through whether a media
/// notification eventually arrives.
#[derive(Clone)]
pub struct CameraHandler {
    queue: CommandQueue,
    shared: Arc<SharedState>,
}

impl CameraHandler {
    /// Spawn the executor thread and wait for it to publish its mailbox
    ///
    /// `driver_factory` produces a fresh driver per `Open` command. The
    /// media indexer is held weakly; when its owner drops it, the next
    /// capture notification releases the camera instead.
    pub fn create(
        driver_factory: DriverFactory,
        indexer: Weak<dyn MediaIndexer>,
        shutter: Option<Arc<dyn ShutterSound>>,
        config: CameraConfig,
    ) -> Result<Self> {
        executor::spawn(driver_factory, indexer, shutter, config)
    }

    pub(crate) fn new(queue: CommandQueue, shared: Arc<SharedState>) -> Self {
        Self { queue, shared }
    }

    /// True while a device session exists
    pub fn is_open(&self) -> bool {
        self.shared.is_open.load(Ordering::Acquire)
    }

    /// True between StartRecording and StopRecording/Close
    pub fn is_recording(&self) -> bool {
        self.shared.is_recording.load(Ordering::Acquire)
    }

    /// True while the executor loop is still draining commands
    pub fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    /// Open the device identified by the control handle
    pub fn open(&self, ctrl: ControlHandle) {
        self.queue.submit(Command::Open(ctrl));
    }

    /// Close the device, stopping preview first and waiting for it
    pub fn close(&self) {
        self.stop_preview_and_wait();
        self.queue.submit(Command::Close);
    }

    /// Start streaming preview frames to the render target
    pub fn start_preview(&self, target: RenderTarget) {
        self.queue.submit(Command::StartPreview(target));
    }

    /// Stop preview and block until it has actually stopped
    ///
    /// Recording is stopped first. Returns immediately when the executor has
    /// already terminated; otherwise the stop rendezvous is guaranteed to be
    /// signaled, even if preview was never running.
    pub fn stop_preview_and_wait(&self) {
        self.stop_recording();
        let snapshot = self.shared.stop_snapshot();
        if !self.queue.submit(Command::StopPreview) {
            return;
        }
        self.shared.wait_preview_stopped(snapshot);
    }

    /// Persist the next delivered frame as a still image
    pub fn capture_still(&self) {
        self.queue.submit(Command::CaptureStill);
    }

    pub fn start_recording(&self) {
        self.queue.submit(Command::StartRecording);
    }

    pub fn stop_recording(&self) {
        self.queue.submit(Command::StopRecording);
    }

    /// Close if needed and terminate the executor thread
    pub fn release(&self) {
        self.queue.submit(Command::Release);
    }
}

impl std::fmt::Debug for CameraHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraHandler")
            .field("is_open", &self.is_open())
            .field("is_recording", &self.is_recording())
            .field("is_alive", &self.is_alive())
            .finish()
    }
}
