//! Drawing session: owns the camera, the inference worker and the
//! interaction state, and runs one tick at a time.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::CanvasConfig;
use crate::hand::LandmarkSet;
use crate::interaction::{ElementLayout, FrameInput, InteractionEvent, InteractionState};

use super::mailbox::InferenceMailbox;
use super::tick::{TickGate, TickTiming};

// ── Errors ─────────────────────────────────────────────────

/// Startup failures.  All of these are fatal to the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open camera: {0}")]
    Camera(String),
    #[error("failed to load landmark detector: {0}")]
    DetectorLoad(#[source] DetectorError),
    #[error("failed to spawn inference worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    #[error("event loop error: {0}")]
    EventLoop(#[from] calloop::Error),
}

/// One failed detection cycle.  Treated as "no hand" for that cycle.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

// ── Collaborators ──────────────────────────────────────────

/// One captured camera image.
///
/// `sequence` and `timestamp_ms` are always set.  The image fields are the
/// contract between a device camera and an image-based detector: the
/// camera fills them, the detector reads them.  Sources that don't carry
/// images (replay) leave them zero and empty, and their detectors key off
/// `sequence` instead.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Monotonic capture counter.
    pub sequence: u64,
    pub timestamp_ms: f64,
    /// Image width in pixels, 0 without an image.
    pub width: u32,
    /// Image height in pixels, 0 without an image.
    pub height: u32,
    /// Packed RGB pixels, row-major, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A frame with no image data.
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            ..Self::default()
        }
    }

    pub fn has_image(&self) -> bool {
        !self.pixels.is_empty()
    }
}

/// Source of camera frames.
pub trait CameraSource {
    /// Acquire the device.
    fn open(&mut self, config: &CanvasConfig) -> Result<(), SessionError>;

    /// Newest frame, or `None` if nothing new is available.
    fn grab(&mut self) -> Option<Frame>;

    /// Release the device.  Called exactly once per successful `open`.
    fn release(&mut self);

    /// True once a finite source has delivered its last frame.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// The hand landmark model.  Runs on the inference worker thread.
pub trait LandmarkDetector: Send + 'static {
    fn load(&mut self) -> Result<(), DetectorError>;

    /// Detect one hand.  `Ok(None)` means no hand in the frame.
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, DetectorError>;

    /// Free the model.  Called when the worker exits.
    fn release(&mut self) {}
}

/// Opened camera, released on drop.
#[derive(Debug)]
struct CameraGuard<C: CameraSource> {
    camera: C,
}

impl<C: CameraSource> CameraGuard<C> {
    fn open(mut camera: C, config: &CanvasConfig) -> Result<Self, SessionError> {
        camera.open(config)?;
        info!("camera opened ({}x{})", config.width, config.height);
        Ok(Self { camera })
    }
}

impl<C: CameraSource> Drop for CameraGuard<C> {
    fn drop(&mut self) {
        self.camera.release();
        info!("camera released");
    }
}

// ── Session ────────────────────────────────────────────────

/// A running drawing session.
///
/// Dropping the session stops the inference worker, releases the detector
/// and then the camera.
pub struct Session<C: CameraSource> {
    // Field order is drop order: the worker stops before the camera goes.
    mailbox: InferenceMailbox,
    camera: CameraGuard<C>,
    state: InteractionState,
    gate: TickGate,
    timing: TickTiming,
    /// Mailbox generation read by the last tick.
    seen_generation: u64,
}

impl<C: CameraSource> Session<C> {
    /// Acquire the camera, load the detector and start inference.
    ///
    /// Anything acquired before a failure is released before returning.
    pub fn start<D: LandmarkDetector>(
        camera: C,
        mut detector: D,
        config: CanvasConfig,
    ) -> Result<Self, SessionError> {
        let camera = CameraGuard::open(camera, &config)?;
        detector.load().map_err(SessionError::DetectorLoad)?;
        info!("landmark detector loaded");
        let mailbox = InferenceMailbox::spawn(detector)?;

        let interval = config.tick_interval_ms();
        Ok(Self {
            mailbox,
            camera,
            state: InteractionState::new(config),
            gate: TickGate::new(interval),
            timing: TickTiming::new(300, interval),
            seen_generation: 0,
        })
    }

    /// Run one tick at `now_ms`.
    ///
    /// Returns `None` if the tick was coalesced.  Otherwise reads the latest
    /// detection, updates the interaction state, advances particles and
    /// issues the next inference request.  Never waits on inference.
    pub fn tick(&mut self, now_ms: f64, layout: &ElementLayout) -> Option<Vec<InteractionEvent>> {
        let dt_ms = self.gate.try_tick(now_ms)?;
        let started = Instant::now();

        self.seen_generation = self.mailbox.generation();
        let landmarks = self.mailbox.latest();
        let events = self.state.update(&FrameInput {
            landmarks: landmarks.as_ref(),
            layout,
            dt_ms,
            now_ms,
        });
        self.state.step_particles();

        // A stopped worker leaves the state machine seeing no hand.
        if self.mailbox.is_running() {
            if self.mailbox.in_flight() {
                self.mailbox.skip();
            } else if let Some(frame) = self.camera.camera.grab() {
                self.mailbox.request(frame);
            }
        }

        self.timing.record(started.elapsed().as_secs_f64() * 1000.0);
        for event in &events {
            debug!("event: {}", event.to_sexp());
        }
        Some(events)
    }

    /// True once no further results can arrive (finite camera exhausted or
    /// inference stopped) and the last one has been consumed by a tick.
    pub fn is_finished(&self) -> bool {
        (self.camera.camera.is_exhausted() || !self.mailbox.is_running())
            && !self.mailbox.in_flight()
            && self.seen_generation == self.mailbox.generation()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn mailbox(&self) -> &InferenceMailbox {
        &self.mailbox
    }

    pub fn gate(&self) -> &TickGate {
        &self.gate
    }

    pub fn timing(&self) -> &TickTiming {
        &self.timing
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:ticks {} :coalesced {} :inference {} :timing {} :state {})",
            self.gate.taken,
            self.gate.skipped,
            self.mailbox.status_sexp(),
            self.timing.stats_sexp(),
            self.state.status_sexp(),
        )
    }
}

impl<C: CameraSource> Drop for Session<C> {
    fn drop(&mut self) {
        info!(
            "session ending after {} ticks ({} paths)",
            self.gate.taken,
            self.state.strokes().paths().len()
        );
        self.mailbox.shutdown();
    }
}

// ── Tests ──────────────────────────────────────────────────
