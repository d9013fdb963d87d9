//! Scan Pipeline
//!
//! Per-tick driver for the capture→score→retain→dispatch→merge loop.
//! Each tick performs bounded, synchronous work: sample a proxy frame,
//! score it, feed the autofocus controller, and gate insertion into the
//! retention buffer. The only long-running operation, the remote OCR call,
//! runs on a detached worker thread guarded by a single in-flight flag.

pub mod retention;

use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::capture::encode::{encode_capture, JPEG_QUALITY, MAX_CAPTURE_DIM};
use crate::capture::frame::RetainedFrame;
use crate::capture::VideoSource;
use crate::config::ScanConfig;
use crate::ocr::TextExtractor;
use crate::scanlog::SharedLogStore;
use crate::vision::autofocus::AutofocusController;
use crate::vision::sharpness::sharpness_score;
use self::retention::RetentionBuffer;

/// Fixed analysis width for the sharpness proxy frame.
///
/// The sharpness threshold is calibrated against this resolution; the two
/// must change together.
pub const ANALYSIS_WIDTH: u32 = 320;

/// Current unix time in milliseconds
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Live pipeline telemetry, read-only from the consumer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTelemetry {
    /// Sharpness score of the most recently sampled frame
    pub sharpness: u32,
    /// Frames currently retained
    pub buffer_fill: usize,
    /// Batch size the buffer dispatches at
    pub max_frames: usize,
    /// Whether an OCR call is outstanding
    pub dispatch_in_flight: bool,
}

/// Batch dispatcher state. The Sending variant is the in-flight flag:
/// at most one batch is ever in transit.
enum DispatchState {
    Idle,
    Sending { done: Receiver<()> },
}

/// Pipeline controller owning the session run state.
pub struct ScanPipeline<S: VideoSource, E: TextExtractor + 'static> {
    config: ScanConfig,
    source: S,
    extractor: Arc<E>,
    log: SharedLogStore,
    buffer: RetentionBuffer,
    autofocus: AutofocusController,
    sharpness: u32,
    last_capture_ms: u64,
    dispatch: DispatchState,
    active: bool,
}

impl<S: VideoSource, E: TextExtractor + 'static> ScanPipeline<S, E> {
    /// Create an inactive pipeline. Configuration is clamped here and
    /// stays immutable for the session's duration.
    pub fn new(config: ScanConfig, source: S, extractor: E, log: SharedLogStore) -> Self {
        let config = config.clamped();
        Self {
            buffer: RetentionBuffer::new(config.max_frames),
            autofocus: AutofocusController::new(config.sharpness_threshold),
            config,
            source,
            extractor: Arc::new(extractor),
            log,
            sharpness: 0,
            last_capture_ms: 0,
            dispatch: DispatchState::Idle,
            active: false,
        }
    }

    /// Start capturing on subsequent ticks
    pub fn activate(&mut self) {
        self.active = true;
        info!(
            max_frames = self.config.max_frames,
            interval_ms = self.config.capture_interval_ms,
            threshold = self.config.sharpness_threshold,
            "scan session active"
        );
    }

    /// Stop capturing and drop any accumulated frames.
    ///
    /// An in-flight OCR call is not cancelled; the detached worker settles
    /// its log entry whenever it completes.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.sharpness = 0;
        self.autofocus.reset();
        info!("scan session stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Run one scheduling tick. Bounded, non-blocking work only.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.active {
            return;
        }

        self.poll_dispatch(now_ms);

        if !self.source.is_ready() {
            return;
        }
        let Some((native_w, native_h)) = self.source.dimensions() else {
            return;
        };
        if native_w == 0 || native_h == 0 {
            return;
        }

        let analysis_h = ((native_h as u64 * ANALYSIS_WIDTH as u64) / native_w as u64).max(1) as u32;
        let proxy = match self.source.sample(ANALYSIS_WIDTH, analysis_h) {
            Ok(buffer) => buffer,
            Err(e) => {
                // Device hiccup: degrade to no frames being scored
                debug!("proxy sample failed: {e:#}");
                self.sharpness = 0;
                return;
            }
        };

        let score = sharpness_score(&proxy);
        self.sharpness = score;

        if self.autofocus.observe(score, now_ms) {
            info!(score, "sustained blur, toggling focus mode");
            if let Err(e) = self.source.trigger_refocus() {
                warn!("refocus attempt failed: {e:#}");
            }
        }

        if score > self.config.sharpness_threshold
            && now_ms.saturating_sub(self.last_capture_ms) > self.config.capture_interval_ms
            && self.buffer.len() < self.config.max_frames
        {
            self.capture(score, now_ms, native_w, native_h);
        }

        self.maybe_dispatch(now_ms);
    }

    /// Pipeline telemetry snapshot
    pub fn telemetry(&self) -> ScanTelemetry {
        ScanTelemetry {
            sharpness: self.sharpness,
            buffer_fill: self.buffer.len(),
            max_frames: self.config.max_frames,
            dispatch_in_flight: matches!(self.dispatch, DispatchState::Sending { .. }),
        }
    }

    /// Shared handle to the batch outcome log
    pub fn log(&self) -> SharedLogStore {
        Arc::clone(&self.log)
    }

    /// Capture the current frame at native resolution, encode it, and
    /// offer it to the retention buffer.
    fn capture(&mut self, score: u32, now_ms: u64, native_w: u32, native_h: u32) {
        let full = match self.source.sample(native_w, native_h) {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("capture sample failed: {e:#}");
                return;
            }
        };
        let jpeg = match encode_capture(&full, MAX_CAPTURE_DIM, JPEG_QUALITY) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("capture encode failed: {e:#}");
                return;
            }
        };

        let retained = self.buffer.try_insert(RetainedFrame::new(jpeg, score, now_ms));
        // The capture happened; the timestamp advances even when ranking
        // discarded the frame.
        self.last_capture_ms = now_ms;
        debug!(score, retained, fill = self.buffer.len(), "frame captured");
    }

    /// Idle -> Sending when the buffer reaches capacity and no dispatch is
    /// outstanding. The worker settles the log entry itself, so a stopped
    /// session still receives the eventual result.
    fn maybe_dispatch(&mut self, now_ms: u64) {
        if !matches!(self.dispatch, DispatchState::Idle) || !self.buffer.is_full() {
            return;
        }

        let thumbnail = self.buffer.frames()[0].jpeg.clone();
        let entry_id = self.log.write().push_pending(thumbnail, now_ms);

        let frames = self.buffer.frames().to_vec();
        let extractor = Arc::clone(&self.extractor);
        let log = Arc::clone(&self.log);
        let model = self.config.model.clone();
        let prompt = self.config.system_prompt.clone();
        let (done_tx, done_rx) = bounded(1);

        info!(batch = frames.len(), "dispatching batch for extraction");
        std::thread::spawn(move || {
            let result = extractor.extract(&frames, &model, &prompt);
            let mut log = log.write();
            match result {
                Ok(outcome) => {
                    debug!(raw_len = outcome.raw_text.len(), "batch extraction succeeded");
                    log.settle_success(entry_id, outcome.merged_text, Some(outcome.payload));
                }
                Err(e) => {
                    warn!("batch extraction failed: {e}");
                    log.settle_error(entry_id, e.to_string());
                }
            }
            let _ = done_tx.send(());
        });

        self.dispatch = DispatchState::Sending { done: done_rx };
    }

    /// Sending -> Idle once the worker signals completion: clear the
    /// buffer unconditionally and restart the capture interval.
    fn poll_dispatch(&mut self, now_ms: u64) {
        if let DispatchState::Sending { done } = &self.dispatch {
            if done.try_recv().is_ok() {
                self.buffer.clear();
                self.last_capture_ms = now_ms;
                self.dispatch = DispatchState::Idle;
                debug!("dispatch settled, buffer cleared");
            }
        }
    }
}
