//! pinchdraw: hand-gesture drawing core.
//!
//! Turns a stream of 21-point hand landmarks into strokes, menu selections
//! and a clear gesture.  `hand` classifies single frames, `interaction`
//! runs the per-frame state machine, `runtime` paces ticks and keeps
//! landmark inference off the tick path.

pub mod config;
pub mod hand;
pub mod interaction;
pub mod runtime;
