//! Interaction layer: the mode state machine and the things it drives.

pub mod menu;
pub mod particles;
pub mod state;
pub mod stroke;

pub use menu::{default_layout, DwellSelector, ElementId, ElementLayout, LayoutError, Rect};
pub use particles::{Particle, ParticleSystem};
pub use state::{FrameInput, InteractionEvent, InteractionState, Mode, RenderState};
pub use stroke::{Brush, DrawingPath, StrokeAccumulator, Tool};
