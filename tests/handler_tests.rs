// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera handler and executor thread
//!
//! Drives the full stack (handler -> queue -> executor -> driver) against a
//! scripted mock driver, including frame delivery through the sink from a
//! "driver" thread owned by the test.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uvc_camera::{
    CameraConfig, CameraDriver, CameraError, CameraFrame, CameraHandler, ControlHandle,
    DriverFactory, FrameSink, MediaIndexer, PixelFormat, PreviewMode, RenderTarget, Result,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Poll until `cond` holds, failing after a generous timeout
fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

/// Scripted driver: records calls, can fail opens and size negotiations a
/// set number of times, and hands the registered frame sink to the test
struct MockDriver {
    log: Arc<Mutex<Vec<String>>>,
    open_failures: Arc<Mutex<u32>>,
    size_failures: Arc<Mutex<u32>>,
    sink_slot: Arc<Mutex<Option<Arc<FrameSink>>>>,
}

impl MockDriver {
    fn record(&self, call: &str) {
        self.log.lock().unwrap().push(call.to_string());
    }
}

impl CameraDriver for MockDriver {
    fn open(&mut self, _ctrl: &ControlHandle) -> Result<()> {
        self.record("open");
        let mut failures = self.open_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            Err(CameraError::OpenFailed("scripted open failure".into()))
        } else {
            Ok(())
        }
    }

    fn close(&mut self) {
        self.record("close");
    }

    fn set_preview_size(&mut self, _w: u32, _h: u32, _mode: PreviewMode) -> Result<()> {
        self.record("set_preview_size");
        let mut failures = self.size_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            Err(CameraError::FormatNotSupported("scripted size failure".into()))
        } else {
            Ok(())
        }
    }

    fn set_frame_callback(&mut self, sink: Arc<FrameSink>, _format: PixelFormat) {
        self.record("set_frame_callback");
        *self.sink_slot.lock().unwrap() = Some(sink);
    }

    fn set_preview_display(&mut self, _target: &RenderTarget) {
        self.record("set_preview_display");
    }

    fn start_preview(&mut self) -> Result<()> {
        self.record("start_preview");
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.record("stop_preview");
    }

    fn destroy(&mut self) {
        self.record("destroy");
    }
}

#[derive(Default)]
struct RecordingIndexer {
    paths: Mutex<Vec<PathBuf>>,
}

impl RecordingIndexer {
    fn count(&self) -> usize {
        self.paths.lock().unwrap().len()
    }
}

impl MediaIndexer for RecordingIndexer {
    fn file_created(&self, path: &Path) {
        self.paths.lock().unwrap().push(path.to_path_buf());
    }
}

struct TestRig {
    handler: CameraHandler,
    log: Arc<Mutex<Vec<String>>>,
    sink_slot: Arc<Mutex<Option<Arc<FrameSink>>>>,
    indexer: Arc<RecordingIndexer>,
    capture_dir: PathBuf,
}

impl TestRig {
    fn new(label: &str, open_failures: u32, size_failures: u32) -> Self {
        init_logging();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink_slot = Arc::new(Mutex::new(None));
        let open_failures = Arc::new(Mutex::new(open_failures));
        let size_failures = Arc::new(Mutex::new(size_failures));

        let factory_log = Arc::clone(&log);
        let factory_slot = Arc::clone(&sink_slot);
        let factory: DriverFactory = Box::new(move || {
            Box::new(MockDriver {
                log: Arc::clone(&factory_log),
                open_failures: Arc::clone(&open_failures),
                size_failures: Arc::clone(&size_failures),
                sink_slot: Arc::clone(&factory_slot),
            })
        });

        let capture_dir = std::env::temp_dir().join(format!(
            "uvc-camera-test-{}-{}",
            std::process::id(),
            label
        ));
        let config = CameraConfig {
            capture_dir: capture_dir.clone(),
            ..CameraConfig::default()
        };

        let indexer = Arc::new(RecordingIndexer::default());
        let indexer_dyn: Arc<dyn MediaIndexer> = indexer.clone();
        // strong count is shared with the concrete Arc held by the rig
        let weak = Arc::downgrade(&indexer_dyn);
        drop(indexer_dyn);

        let handler =
            CameraHandler::create(factory, weak, None, config).expect("executor failed to start");

        Self {
            handler,
            log,
            sink_slot,
            indexer,
            capture_dir,
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn sink(&self) -> Arc<FrameSink> {
        Arc::clone(self.sink_slot.lock().unwrap().as_ref().expect("no sink registered"))
    }

    fn deliver_frame(&self) {
        // 2x2 RGB565 frame, little-endian
        let frame = CameraFrame {
            width: 2,
            height: 2,
            format: PixelFormat::Rgb565,
            data: Arc::from(vec![0xffu8; 8]),
        };
        self.sink().on_frame(&frame);
    }

    fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(&self.capture_dir);
    }
}

fn ctrl() -> ControlHandle {
    ControlHandle {
        device_name: "Mock UVC Camera".into(),
        vendor_id: 0x046d,
        product_id: 0x0825,
    }
}

fn target() -> RenderTarget {
    RenderTarget { surface_id: 7 }
}

#[test]
fn test_lifecycle_open_preview_stop_close() {
    let rig = TestRig::new("lifecycle", 0, 0);
    rig.handler.open(ctrl());
    rig.handler.start_preview(target());
    assert!(wait_until(|| rig.handler.is_open()));

    rig.handler.stop_preview_and_wait();
    rig.handler.close();
    assert!(wait_until(|| !rig.handler.is_open()));

    assert_eq!(
        rig.log(),
        vec![
            "open",
            "set_preview_size",
            "set_frame_callback",
            "set_preview_display",
            "start_preview",
            "stop_preview",
            "close",
            "destroy",
        ]
    );
    assert!(rig.handler.is_alive());
}

#[test]
fn test_stop_wait_without_preview_returns_and_skips_driver() {
    let rig = TestRig::new("stopwait", 0, 0);

    // no session at all: must return, not deadlock
    rig.handler.stop_preview_and_wait();

    // open but never previewing: still no driver stop_preview
    rig.handler.open(ctrl());
    rig.handler.stop_preview_and_wait();
    assert!(!rig.log().iter().any(|c| c == "stop_preview"));
}

#[test]
fn test_capture_is_one_shot_per_request() {
    let rig = TestRig::new("capture", 0, 0);
    rig.handler.open(ctrl());
    rig.handler.start_preview(target());
    assert!(wait_until(|| rig.sink_slot.lock().unwrap().is_some()));

    rig.handler.capture_still();
    rig.handler.stop_preview_and_wait(); // barrier: capture flag is armed

    rig.deliver_frame();
    assert!(wait_until(|| rig.indexer.count() == 1));

    // a second frame without a new CaptureStill must not notify again
    rig.deliver_frame();

    rig.handler.capture_still();
    rig.handler.stop_preview_and_wait();
    rig.deliver_frame();
    assert!(wait_until(|| rig.indexer.count() == 2));
    assert_eq!(rig.indexer.count(), 2);

    for path in rig.indexer.paths.lock().unwrap().iter() {
        assert!(path.exists(), "captured file missing: {}", path.display());
        assert!(path.starts_with(&rig.capture_dir));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }

    rig.handler.close();
    assert!(wait_until(|| !rig.handler.is_open()));
    rig.cleanup();
}

#[test]
fn test_indexer_dropped_triggers_release() {
    let rig = TestRig::new("noindexer", 0, 0);
    rig.handler.open(ctrl());
    rig.handler.start_preview(target());
    assert!(wait_until(|| rig.sink_slot.lock().unwrap().is_some()));

    rig.handler.capture_still();
    rig.handler.stop_preview_and_wait();

    // drop the owning context before the notification lands
    let weak_probe = Arc::downgrade(&rig.indexer);
    let TestRig {
        handler,
        sink_slot,
        capture_dir,
        indexer,
        ..
    } = rig;
    drop(indexer);
    assert!(weak_probe.upgrade().is_none());

    let sink = Arc::clone(sink_slot.lock().unwrap().as_ref().unwrap());
    let frame = CameraFrame {
        width: 2,
        height: 2,
        format: PixelFormat::Rgb565,
        data: Arc::from(vec![0xffu8; 8]),
    };
    sink.on_frame(&frame);

    assert!(wait_until(|| !handler.is_alive()));
    assert!(!handler.is_open());
    let _ = std::fs::remove_dir_all(capture_dir);
}

#[test]
fn test_double_size_failure_closes_with_single_destroy() {
    let rig = TestRig::new("sizefail", 0, 2);
    rig.handler.open(ctrl());
    rig.handler.start_preview(target());
    rig.handler.stop_preview_and_wait(); // barrier

    assert!(!rig.handler.is_open());
    let log = rig.log();
    assert_eq!(log.iter().filter(|c| *c == "destroy").count(), 1);
    assert!(!log.iter().any(|c| c == "start_preview"));
}

#[test]
fn test_size_fallback_keeps_preview_running() {
    let rig = TestRig::new("sizefallback", 0, 1);
    rig.handler.open(ctrl());
    rig.handler.start_preview(target());
    rig.handler.stop_preview_and_wait(); // barrier

    assert!(rig.handler.is_open());
    let log = rig.log();
    assert_eq!(log.iter().filter(|c| *c == "set_preview_size").count(), 2);
    assert!(log.iter().any(|c| c == "start_preview"));
}

#[test]
fn test_open_failure_is_survivable() {
    let rig = TestRig::new("openfail", 1, 0);
    rig.handler.open(ctrl());
    rig.handler.stop_preview_and_wait(); // barrier

    assert!(!rig.handler.is_open());
    assert!(rig.handler.is_alive());

    // a later open succeeds on the same executor
    rig.handler.open(ctrl());
    assert!(wait_until(|| rig.handler.is_open()));
}

#[test]
fn test_release_while_recording_keeps_executor_alive() {
    let rig = TestRig::new("releasequirk", 0, 0);
    rig.handler.start_recording();
    rig.handler.release();

    // processed after Release, so returning proves the loop survived it
    rig.handler.stop_preview_and_wait();
    assert!(rig.handler.is_alive());
    assert!(!rig.handler.is_recording());

    // recording indicator is now clear, so a second release terminates
    rig.handler.release();
    assert!(wait_until(|| !rig.handler.is_alive()));
}

#[test]
fn test_release_terminates_and_later_calls_are_safe() {
    let rig = TestRig::new("release", 0, 0);
    rig.handler.open(ctrl());
    rig.handler.release();
    assert!(wait_until(|| !rig.handler.is_alive()));
    assert!(!rig.handler.is_open());

    // commands to a terminated executor are silent no-ops
    rig.handler.open(ctrl());
    rig.handler.capture_still();
    rig.handler.stop_preview_and_wait();
    assert!(!rig.handler.is_open());
}

#[test]
fn test_replaying_a_sequence_is_deterministic() {
    fn run_once(label: &str) -> (Vec<String>, bool, bool) {
        let rig = TestRig::new(label, 0, 1);
        rig.handler.open(ctrl());
        rig.handler.start_preview(target());
        rig.handler.start_recording();
        rig.handler.stop_preview_and_wait();
        rig.handler.open(ctrl());
        rig.handler.close();
        assert!(wait_until(|| !rig.handler.is_open()));
        (rig.log(), rig.handler.is_open(), rig.handler.is_recording())
    }

    let first = run_once("replay-a");
    let second = run_once("replay-b");
    assert_eq!(first, second);
}
