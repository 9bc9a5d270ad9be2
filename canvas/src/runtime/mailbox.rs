//! Single-slot inference mailbox.
//!
//! A dedicated worker thread owns the detector.  The tick hands it at most
//! one frame at a time; the worker writes the newest result into a shared
//! slot that every tick reads without waiting.  Results persist until the
//! next one replaces them.  If the detector panics the worker publishes
//! "no hand", releases the detector and stops.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::hand::LandmarkSet;

use super::session::{Frame, LandmarkDetector, SessionError};

/// State shared between the tick and the worker.
#[derive(Debug, Default)]
struct Slot {
    latest: Mutex<Option<LandmarkSet>>,
    in_flight: AtomicBool,
    /// Bumped after every result (including failures) is published.
    generation: AtomicU64,
    failures: AtomicU64,
    /// Set when the worker has stopped taking requests.
    stopped: AtomicBool,
}

/// Loaded detector, released on drop.
struct DetectorGuard<D: LandmarkDetector> {
    detector: D,
}

impl<D: LandmarkDetector> Drop for DetectorGuard<D> {
    fn drop(&mut self) {
        self.detector.release();
        info!("landmark detector released");
    }
}

/// Latest-result-wins mailbox with a single request in flight.
#[derive(Debug)]
pub struct InferenceMailbox {
    slot: Arc<Slot>,
    requests: Option<Sender<Frame>>,
    worker: Option<JoinHandle<()>>,
    /// Requests handed to the worker.
    pub issued: u64,
    /// Requests dropped because one was still outstanding.
    pub dropped: u64,
}

impl InferenceMailbox {
    /// Spawn the inference worker.  The detector must already be loaded;
    /// it is released when the worker exits.
    pub fn spawn<D: LandmarkDetector>(detector: D) -> Result<Self, SessionError> {
        let (tx, rx) = bounded::<Frame>(1);
        let slot = Arc::new(Slot::default());
        let worker_slot = Arc::clone(&slot);
        // If the spawn fails the closure, and with it the guard, is dropped.
        let guard = DetectorGuard { detector };

        let worker = thread::Builder::new()
            .name("pinchdraw-inference".into())
            .spawn(move || run_worker(guard, rx, worker_slot))
            .map_err(SessionError::WorkerSpawn)?;

        info!("inference worker started");
        Ok(Self {
            slot,
            requests: Some(tx),
            worker: Some(worker),
            issued: 0,
            dropped: 0,
        })
    }

    /// The most recent detection, if the last completed cycle found a hand.
    pub fn latest(&self) -> Option<LandmarkSet> {
        self.slot.latest.lock().clone()
    }

    /// Number of results published so far.
    pub fn generation(&self) -> u64 {
        self.slot.generation.load(Ordering::Acquire)
    }

    /// False once the worker has stopped, e.g. after a detector panic.
    pub fn is_running(&self) -> bool {
        self.requests.is_some() && !self.slot.stopped.load(Ordering::Acquire)
    }

    pub fn in_flight(&self) -> bool {
        self.slot.in_flight.load(Ordering::Acquire)
    }

    pub fn failures(&self) -> u64 {
        self.slot.failures.load(Ordering::Relaxed)
    }

    /// Record a tick that wanted inference while a request was outstanding.
    pub fn skip(&mut self) {
        self.dropped += 1;
        trace!("inference busy, dropped request ({} total)", self.dropped);
    }

    /// Hand a frame to the worker.  Never blocks: returns `false` and drops
    /// the frame if a request is already in flight or the worker is gone.
    pub fn request(&mut self, frame: Frame) -> bool {
        let Some(tx) = self.requests.as_ref() else {
            return false;
        };
        if self.slot.stopped.load(Ordering::Acquire) {
            return false;
        }
        if self.slot.in_flight.swap(true, Ordering::AcqRel) {
            self.skip();
            return false;
        }
        match tx.try_send(frame) {
            Ok(()) => {
                self.issued += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                // Worker has not picked up the previous frame yet.
                self.skip();
                clear_in_flight(&self.slot);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("inference worker disconnected");
                clear_in_flight(&self.slot);
                false
            }
        }
    }

    /// Stop the worker and wait for it to release the detector.
    pub fn shutdown(&mut self) {
        // Closing the channel ends the worker's receive loop.
        self.requests.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("inference worker panicked");
            }
            info!(
                "inference worker stopped ({} issued, {} dropped, {} failed)",
                self.issued,
                self.dropped,
                self.failures()
            );
        }
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:running {} :issued {} :dropped {} :completed {} :failures {} :in-flight {} :hand {})",
            if self.is_running() { "t" } else { "nil" },
            self.issued,
            self.dropped,
            self.generation(),
            self.failures(),
            if self.in_flight() { "t" } else { "nil" },
            if self.slot.latest.lock().is_some() { "t" } else { "nil" },
        )
    }
}

impl Drop for InferenceMailbox {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn clear_in_flight(slot: &Slot) {
    slot.in_flight.store(false, Ordering::Release);
}

fn publish(slot: &Slot, result: Option<LandmarkSet>) {
    *slot.latest.lock() = result;
    slot.generation.fetch_add(1, Ordering::AcqRel);
    slot.in_flight.store(false, Ordering::Release);
}

fn run_worker<D: LandmarkDetector>(mut guard: DetectorGuard<D>, rx: Receiver<Frame>, slot: Arc<Slot>) {
    for frame in rx.iter() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| guard.detector.detect(&frame)));
        let result = match outcome {
            Ok(Ok(hand)) => hand,
            Ok(Err(e)) => {
                warn!("inference failed for frame {}: {}", frame.sequence, e);
                slot.failures.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(_) => {
                error!("detector panicked on frame {}, stopping inference", frame.sequence);
                slot.failures.fetch_add(1, Ordering::Relaxed);
                slot.stopped.store(true, Ordering::Release);
                publish(&slot, None);
                break;
            }
        };
        trace!(
            "frame {} ({}): {}",
            frame.sequence,
            if frame.has_image() {
                format!("{}x{}", frame.width, frame.height)
            } else {
                "no image".to_string()
            },
            if result.is_some() { "hand" } else { "no hand" }
        );
        publish(&slot, result);
    }
    slot.stopped.store(true, Ordering::Release);
    debug!("inference worker exiting");
}

// ── Tests ──────────────────────────────────────────────────
