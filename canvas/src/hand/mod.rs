//! Hand input: landmark model, gesture classification, cursor smoothing.

pub mod gesture;
pub mod landmarks;
pub mod smoothing;

pub use gesture::{GestureKind, GestureReading};
pub use landmarks::{HandLandmark, Landmark, LandmarkSet, Point, LANDMARK_COUNT};
pub use smoothing::PositionFilter;
