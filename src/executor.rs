// SPDX-License-Identifier: GPL-3.0-only

//! Executor thread — owns the device session and drains the command queue
//!
//! All driver calls happen on this single thread. Commands are executed one
//! at a time, in submission order; a command's side effects are complete
//! before the next command begins. The loop terminates only on a `Release`
//! command (or when every submission handle is gone).

use crate::command::{self, Command, CommandReceiver};
use crate::config::CameraConfig;
use crate::driver::{
    CameraDriver, ControlHandle, DriverFactory, MediaIndexer, PreviewMode, RenderTarget,
    ShutterSound,
};
use crate::error::{CameraError, Result};
use crate::handler::CameraHandler;
use crate::sink::FrameSink;
use crate::types::PixelFormat;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak, mpsc};
use tracing::{debug, error, info, warn};

/// State shared between the executor thread and caller threads
///
/// The status flags are written by the executor and read by status queries;
/// the stop generation backs the repeatable "preview fully stopped"
/// rendezvous.
pub(crate) struct SharedState {
    pub(crate) is_open: AtomicBool,
    pub(crate) is_recording: AtomicBool,
    alive: AtomicBool,
    stop_generation: Mutex<u64>,
    stopped: Condvar,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            is_open: AtomicBool::new(false),
            is_recording: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            stop_generation: Mutex::new(0),
            stopped: Condvar::new(),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Signal the stop rendezvous; called unconditionally at the end of
    /// every StopPreview handling
    pub(crate) fn signal_preview_stopped(&self) {
        let mut generation = self
            .stop_generation
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *generation += 1;
        self.stopped.notify_all();
    }

    /// Generation to snapshot before submitting a StopPreview
    pub(crate) fn stop_snapshot(&self) -> u64 {
        *self
            .stop_generation
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Block until a StopPreview completed after `snapshot` was taken
    ///
    /// Also returns when the executor terminates, so no waiter outlives the
    /// loop it is waiting on.
    pub(crate) fn wait_preview_stopped(&self, snapshot: u64) {
        let mut generation = self
            .stop_generation
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        while *generation == snapshot {
            generation = self
                .stopped
                .wait(generation)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Mark the executor terminated and wake every rendezvous waiter
    fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
        self.signal_preview_stopped();
    }
}

/// The open driver handle; exists from a successful Open until Close or
/// Release, at most one at a time
struct DeviceSession {
    driver: Box<dyn CameraDriver>,
}

/// Per-thread executor state
pub(crate) struct CameraThread {
    driver_factory: DriverFactory,
    config: CameraConfig,
    session: Option<DeviceSession>,
    previewing: bool,
    sink: Arc<FrameSink>,
    shared: Arc<SharedState>,
    indexer: Weak<dyn MediaIndexer>,
}

impl CameraThread {
    pub(crate) fn new(
        driver_factory: DriverFactory,
        config: CameraConfig,
        sink: Arc<FrameSink>,
        shared: Arc<SharedState>,
        indexer: Weak<dyn MediaIndexer>,
    ) -> Self {
        Self {
            driver_factory,
            config,
            session: None,
            previewing: false,
            sink,
            shared,
            indexer,
        }
    }

    /// Drain the command queue until released
    pub(crate) fn run(mut self, rx: CommandReceiver) {
        info!("Camera executor started");
        while let Some(command) = rx.next_blocking() {
            if self.handle(command).is_break() {
                break;
            }
        }
        if self.session.is_some() {
            self.handle_close();
        }
        self.shared.mark_dead();
        info!("Camera executor terminated");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Open(ctrl) => self.handle_open(ctrl),
            Command::Close => self.handle_close(),
            Command::StartPreview(target) => self.handle_start_preview(target),
            Command::StopPreview => self.handle_stop_preview(),
            Command::CaptureStill => self.handle_capture_still(),
            Command::StartRecording => self.handle_start_recording(),
            Command::StopRecording => self.handle_stop_recording(),
            Command::MediaUpdated(path) => return self.handle_update_media(path),
            Command::Release => return self.handle_release(),
        }
        ControlFlow::Continue(())
    }

    /// Open a fresh driver instance, closing any previous session first
    ///
    /// An open failure leaves the state machine in Closed instead of taking
    /// the executor down; callers observe it through `is_open()`.
    fn handle_open(&mut self, ctrl: ControlHandle) {
        self.handle_close();
        let mut driver = (self.driver_factory)();
        match driver.open(&ctrl) {
            Ok(()) => {
                info!(device = %ctrl.device_name, "Camera opened");
                self.session = Some(DeviceSession { driver });
                self.shared.is_open.store(true, Ordering::Release);
            }
            Err(e) => {
                error!(error = %e, device = %ctrl.device_name, "Camera open failed");
                driver.destroy();
            }
        }
    }

    /// Idempotent close: stops recording and preview, destroys the handle
    fn handle_close(&mut self) {
        self.handle_stop_recording();
        if let Some(mut session) = self.session.take() {
            if self.previewing {
                session.driver.stop_preview();
            }
            session.driver.close();
            session.driver.destroy();
            info!("Camera closed");
        }
        self.previewing = false;
        self.shared.is_open.store(false, Ordering::Release);
    }

    fn handle_start_preview(&mut self, target: RenderTarget) {
        if self.session.is_none() {
            debug!("StartPreview with no open session, ignoring");
            return;
        }
        if !self.negotiate_preview_size() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session
            .driver
            .set_frame_callback(Arc::clone(&self.sink), PixelFormat::Rgb565);
        session.driver.set_preview_display(&target);
        match session.driver.start_preview() {
            Ok(()) => {
                info!(surface = target.surface_id, "Preview started");
                self.previewing = true;
            }
            Err(e) => {
                error!(error = %e, "Preview start failed, closing camera");
                self.handle_close();
            }
        }
    }

    /// Negotiate the preview size, falling back once to YUYV
    ///
    /// A second rejection force-closes the device (implicit Close), so the
    /// state machine returns to Closed without surfacing an error.
    fn negotiate_preview_size(&mut self) -> bool {
        let (width, height) = (self.config.preview_width, self.config.preview_height);
        let mode = self.config.preview_mode;
        let negotiated = {
            let Some(session) = self.session.as_mut() else {
                return false;
            };
            match session.driver.set_preview_size(width, height, mode) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, %mode, "Preview size rejected, retrying in YUYV");
                    match session
                        .driver
                        .set_preview_size(width, height, PreviewMode::Yuyv)
                    {
                        Ok(()) => true,
                        Err(e) => {
                            error!(error = %e, "Fallback preview mode rejected, closing camera");
                            false
                        }
                    }
                }
            }
        };
        if !negotiated {
            self.handle_close();
        }
        negotiated
    }

    /// Stop the preview stream and signal the stop rendezvous
    ///
    /// The rendezvous is signaled even when preview was never running, so a
    /// blocked `stop_preview_and_wait` always returns.
    fn handle_stop_preview(&mut self) {
        if self.previewing
            && let Some(session) = self.session.as_mut()
        {
            session.driver.stop_preview();
            info!("Preview stopped");
        }
        self.previewing = false;
        self.shared.signal_preview_stopped();
    }

    /// Arm the capture flag and return; the frame sink persists the next
    /// frame off this thread
    fn handle_capture_still(&mut self) {
        debug!("Still capture armed");
        self.sink.request_capture();
    }

    fn handle_start_recording(&mut self) {
        debug!("Recording indicator set");
        self.shared.is_recording.store(true, Ordering::Release);
    }

    fn handle_stop_recording(&mut self) {
        self.shared.is_recording.store(false, Ordering::Release);
    }

    /// Notify the media indexer about a freshly written still
    ///
    /// When the owning context is gone the notification is abandoned and the
    /// camera released instead (best-effort fallback, not an error).
    fn handle_update_media(&mut self, path: PathBuf) -> ControlFlow<()> {
        match self.indexer.upgrade() {
            Some(indexer) => {
                info!(path = %path.display(), "Notifying media indexer");
                indexer.file_created(&path);
                ControlFlow::Continue(())
            }
            None => {
                warn!("Media indexer owner gone, releasing camera");
                self.handle_release()
            }
        }
    }

    /// Close if needed, then terminate the loop — unless a recording is in
    /// progress, in which case the loop is kept alive
    fn handle_release(&mut self) -> ControlFlow<()> {
        let recording = self.shared.is_recording.load(Ordering::Acquire);
        self.handle_close();
        if recording {
            warn!("Release while recording, executor kept alive");
            ControlFlow::Continue(())
        } else {
            info!("Camera released");
            ControlFlow::Break(())
        }
    }
}

/// Spawn the executor thread and block until it publishes its handle
///
/// The executor constructs the command-submission handle as its very first
/// action and sends it through a one-shot rendezvous; the caller returns
/// with a handle that is guaranteed to reach a live mailbox.
pub(crate) fn spawn(
    driver_factory: DriverFactory,
    indexer: Weak<dyn MediaIndexer>,
    shutter: Option<Arc<dyn ShutterSound>>,
    config: CameraConfig,
) -> Result<CameraHandler> {
    let (queue, rx) = command::channel();
    let (init_tx, init_rx) = mpsc::sync_channel(1);

    std::thread::Builder::new()
        .name("camera-executor".into())
        .spawn(move || {
            let shared = Arc::new(SharedState::new());
            let sink = Arc::new(FrameSink::new(&config, queue.clone(), shutter));
            let handler = CameraHandler::new(queue, Arc::clone(&shared));
            if init_tx.send(handler).is_err() {
                return;
            }
            CameraThread::new(driver_factory, config, sink, shared, indexer).run(rx);
        })
        .map_err(|e| CameraError::ExecutorStartup(e.to_string()))?;

    init_rx.recv().map_err(|_| {
        CameraError::ExecutorStartup("executor thread died before publishing its handle".into())
    })
}
