//! Runtime: tick pacing, the inference mailbox, session lifecycle, the
//! event loop and recorded-input replay.

pub mod event_loop;
pub mod mailbox;
pub mod replay;
pub mod session;
pub mod tick;

pub use event_loop::{install_signal_handlers, run_event_loop, LoopConfig, StopReason};
pub use mailbox::InferenceMailbox;
pub use replay::{Recording, RecordingError, ReplayCamera, ReplayDetector};
pub use session::{CameraSource, DetectorError, Frame, LandmarkDetector, Session, SessionError};
pub use tick::{TickGate, TickTiming};
