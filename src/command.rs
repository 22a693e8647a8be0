// SPDX-License-Identifier: GPL-3.0-only

//! Command queue between caller threads and the executor
//!
//! A thin wrapper around `std::sync::mpsc`: unbounded, globally FIFO across
//! all submitters, consumed one command at a time by the executor thread.

use crate::driver::{ControlHandle, RenderTarget};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::debug;

/// A discrete request processed by the executor
///
/// Commands are immutable once enqueued and consumed exactly once.
#[derive(Debug)]
pub enum Command {
    /// Open the device identified by the control handle
    Open(ControlHandle),
    /// Stop preview and recording, close and destroy the device handle
    Close,
    /// Negotiate preview size and start streaming to the render target
    StartPreview(RenderTarget),
    /// Stop preview; always signals the stop rendezvous
    StopPreview,
    /// Arm the capture flag; the next delivered frame is persisted
    CaptureStill,
    /// Flip the recording indicator on
    StartRecording,
    /// Flip the recording indicator off
    StopRecording,
    /// A captured still was written; notify the media indexer
    MediaUpdated(PathBuf),
    /// Close if needed and terminate the executor loop
    Release,
}

/// Submission side of the command queue
///
/// Clonable and callable from any thread; `submit` never blocks.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    tx: mpsc::Sender<Command>,
}

impl CommandQueue {
    /// Enqueue a command for the executor
    ///
    /// Returns false when the executor loop has already terminated, in
    /// which case the command is dropped. This mirrors messages sent to a
    /// dead handler thread: a silent no-op, not an error.
    pub fn submit(&self, command: Command) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(mpsc::SendError(command)) => {
                debug!(?command, "Executor gone, dropping command");
                false
            }
        }
    }
}

/// Consumption side of the command queue, owned by the executor thread
pub(crate) struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Block until the next command is available
    ///
    /// Returns None when every submission handle has been dropped.
    pub(crate) fn next_blocking(&self) -> Option<Command> {
        self.rx.recv().ok()
    }
}

/// Create a connected queue/receiver pair
pub(crate) fn channel() -> (CommandQueue, CommandReceiver) {
    let (tx, rx) = mpsc::channel();
    (CommandQueue { tx }, CommandReceiver { rx })
}
