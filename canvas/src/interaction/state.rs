//! The per-frame interaction state machine.
//!
//! Modes: IDLE (no usable hand), HOVER (hand present, not drawing, menu
//! closed), DRAWING (confirmed pinch), MENU (menu open).  Each frame runs
//! the same phases in order: detection, safe-zone check, smoothing, global
//! gestures (menu toggle, clear), then the logic of the current mode.
//! `InteractionState` is owned by the tick loop and only mutated through
//! `update` and `step_particles`.

use tracing::{debug, info, trace};

use crate::config::{
    in_safe_zone, CanvasConfig, DEBOUNCE_FRAMES, MENU_TOGGLE_COOLDOWN_MS,
    OPEN_PALM_CONFIRM_FRAMES, PINCH_END_RATIO, PINCH_START_RATIO,
};
use crate::hand::{GestureReading, LandmarkSet, Point, PositionFilter};

use super::menu::{DwellSelector, ElementId, ElementLayout};
use super::particles::{Particle, ParticleSystem};
use super::stroke::{Brush, DrawingPath, StrokeAccumulator};

// ── Mode ───────────────────────────────────────────────────

/// Interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Idle,
    Hover,
    Drawing,
    Menu,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Hover => "hover",
            Self::Drawing => "drawing",
            Self::Menu => "menu",
        }
    }
}

// ── Input / events ─────────────────────────────────────────

/// Everything one tick feeds into the state machine.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Latest detection; `None` when no hand was found or inference failed.
    pub landmarks: Option<&'a LandmarkSet>,
    /// Menu element rectangles from the UI layer.
    pub layout: &'a ElementLayout,
    /// Time since the previous tick.
    pub dt_ms: f64,
    /// Monotonic clock, used for the menu-toggle cooldown.
    pub now_ms: f64,
}

/// Events emitted by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    ModeChanged { from: Mode, to: Mode },
    StrokeStarted { at: Point },
    StrokeFinished { points: usize },
    MenuToggled { open: bool },
    /// The canvas was dissolved into this many particles.
    Cleared { particles: usize },
    Selected { element: ElementId },
    /// The hand disappeared or left the safe zone.
    TrackingLost,
}

impl InteractionEvent {
    /// Convert the event to an s-expression.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::ModeChanged { from, to } => format!(
                "(:type :event :event :mode-changed :from :{} :to :{})",
                from.as_str(),
                to.as_str(),
            ),
            Self::StrokeStarted { at } => format!(
                "(:type :event :event :stroke-started :at ({:.1} {:.1}))",
                at.x, at.y,
            ),
            Self::StrokeFinished { points } => {
                format!("(:type :event :event :stroke-finished :points {})", points)
            }
            Self::MenuToggled { open } => format!(
                "(:type :event :event :menu-toggled :open {})",
                if *open { "t" } else { "nil" },
            ),
            Self::Cleared { particles } => {
                format!("(:type :event :event :cleared :particles {})", particles)
            }
            Self::Selected { element } => format!(
                "(:type :event :event :selected :element \"{}\")",
                element.as_str(),
            ),
            Self::TrackingLost => "(:type :event :event :tracking-lost)".to_string(),
        }
    }
}

// ── Render state ───────────────────────────────────────────

/// What the renderer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct RenderState<'a> {
    pub paths: &'a [DrawingPath],
    /// Points of the stroke being drawn, empty when not drawing.
    pub active_path: &'a [Point],
    pub particles: &'a [Particle],
    pub mode: Mode,
    pub cursor: Option<Point>,
    pub menu_open: bool,
    pub brush: &'a Brush,
    pub hovered: Option<ElementId>,
    /// Dwell progress toward selecting `hovered`, in [0, 1].
    pub dwell_progress: f32,
}

// ── State ──────────────────────────────────────────────────

/// Central interaction state.
#[derive(Debug)]
pub struct InteractionState {
    /// Canvas geometry used for the normalized → pixel conversion.
    pub canvas: CanvasConfig,
    mode: Mode,
    menu_open: bool,
    /// Consecutive frames below the pinch start ratio.
    pinch_in_frames: i32,
    /// Exit debounce while drawing; the stroke ends when it goes negative.
    pinch_out_frames: i32,
    /// Consecutive open-palm frames.
    open_palm_frames: u32,
    last_menu_toggle_ms: Option<f64>,
    filter: PositionFilter,
    cursor: Option<Point>,
    brush: Brush,
    strokes: StrokeAccumulator,
    selector: DwellSelector,
    particles: ParticleSystem,
}

impl InteractionState {
    pub fn new(canvas: CanvasConfig) -> Self {
        Self::with_strokes(canvas, StrokeAccumulator::new())
    }

    /// State with a caller-provided stroke accumulator (e.g. a seeded RNG).
    pub fn with_strokes(canvas: CanvasConfig, strokes: StrokeAccumulator) -> Self {
        Self {
            canvas,
            mode: Mode::Idle,
            menu_open: false,
            pinch_in_frames: 0,
            pinch_out_frames: DEBOUNCE_FRAMES,
            open_palm_frames: 0,
            last_menu_toggle_ms: None,
            filter: PositionFilter::new(),
            cursor: None,
            brush: Brush::default(),
            strokes,
            selector: DwellSelector::new(),
            particles: ParticleSystem::new(),
        }
    }

    /// Process one frame and return the events it produced.
    pub fn update(&mut self, input: &FrameInput<'_>) -> Vec<InteractionEvent> {
        let mut events = Vec::new();

        let Some(landmarks) = input.landmarks else {
            self.lose_tracking(&mut events);
            return events;
        };
        let reading = GestureReading::from_landmarks(landmarks);
        trace!(
            "reading: size={:.3} ratio={:.3} gesture={}",
            reading.hand_size,
            reading.pinch_ratio,
            reading.kind(PINCH_START_RATIO).as_str()
        );

        // Menu pointing follows the fingertip; drawing follows the pinch.
        let source = if self.menu_open {
            reading.index_tip
        } else {
            reading.pinch_midpoint
        };
        if !in_safe_zone(source.x, source.y) {
            self.lose_tracking(&mut events);
            return events;
        }

        let (px, py) = self.canvas.to_pixels(source.x, source.y);
        let cursor = self.filter.filter(Point::new(px, py));
        self.cursor = Some(cursor);

        if self.mode != Mode::Drawing {
            self.check_menu_toggle(&reading, input.now_ms, &mut events);

            if !self.menu_open && reading.victory {
                let particles = self.strokes.dissolve();
                if !particles.is_empty() {
                    events.push(InteractionEvent::Cleared {
                        particles: particles.len(),
                    });
                    self.particles.spawn(particles);
                }
                self.set_mode(Mode::Hover, &mut events);
                return events;
            }
        }

        if self.menu_open {
            self.update_menu(&reading, cursor, input, &mut events);
        } else if self.mode == Mode::Drawing {
            self.update_drawing(&reading, cursor, &mut events);
        } else {
            self.update_hover(&reading, cursor, &mut events);
        }

        events
    }

    /// Advance dissolve particles by one frame.  Anything below the canvas
    /// is dropped.
    pub fn step_particles(&mut self) {
        self.particles.step(self.canvas.height);
    }

    /// No usable hand: finish any stroke and drop to IDLE.
    fn lose_tracking(&mut self, events: &mut Vec<InteractionEvent>) {
        if self.mode != Mode::Idle {
            debug!("tracking lost in {} mode", self.mode.as_str());
            events.push(InteractionEvent::TrackingLost);
        }
        if let Some(points) = self.strokes.end_stroke(&self.brush) {
            events.push(InteractionEvent::StrokeFinished { points });
        }
        self.filter.reset();
        self.cursor = None;
        self.pinch_in_frames = 0;
        self.pinch_out_frames = DEBOUNCE_FRAMES;
        self.open_palm_frames = 0;
        self.selector.clear();
        self.set_mode(Mode::Idle, events);
    }

    /// Open palm held past the confirm count toggles the menu, at most once
    /// per cooldown.
    fn check_menu_toggle(
        &mut self,
        reading: &GestureReading,
        now_ms: f64,
        events: &mut Vec<InteractionEvent>,
    ) {
        if !reading.open_palm {
            self.open_palm_frames = 0;
            return;
        }
        self.open_palm_frames += 1;
        if self.open_palm_frames <= OPEN_PALM_CONFIRM_FRAMES {
            return;
        }
        let cooled_down = self
            .last_menu_toggle_ms
            .map_or(true, |last| now_ms - last >= MENU_TOGGLE_COOLDOWN_MS);
        if !cooled_down {
            return;
        }

        self.menu_open = !self.menu_open;
        self.last_menu_toggle_ms = Some(now_ms);
        self.open_palm_frames = 0;
        self.pinch_in_frames = 0;
        self.selector.clear();
        info!("menu {}", if self.menu_open { "opened" } else { "closed" });
        events.push(InteractionEvent::MenuToggled {
            open: self.menu_open,
        });
    }

    /// MENU: point with the index finger; other fingers are not checked.
    fn update_menu(
        &mut self,
        reading: &GestureReading,
        cursor: Point,
        input: &FrameInput<'_>,
        events: &mut Vec<InteractionEvent>,
    ) {
        self.set_mode(Mode::Menu, events);
        if !reading.index_extended {
            self.selector.clear();
            return;
        }
        if let Some(element) = self.selector.update(cursor, input.layout, input.dt_ms) {
            element.apply(&mut self.brush);
            events.push(InteractionEvent::Selected { element });
        }
    }

    /// DRAWING: append while pinched, count down toward release otherwise.
    fn update_drawing(
        &mut self,
        reading: &GestureReading,
        cursor: Point,
        events: &mut Vec<InteractionEvent>,
    ) {
        if reading.pinch_ratio > PINCH_END_RATIO {
            self.pinch_out_frames -= 1;
            trace!("pinch release pending: {}", self.pinch_out_frames);
            if self.pinch_out_frames < 0 {
                if let Some(points) = self.strokes.end_stroke(&self.brush) {
                    events.push(InteractionEvent::StrokeFinished { points });
                }
                self.pinch_in_frames = 0;
                self.pinch_out_frames = DEBOUNCE_FRAMES;
                self.set_mode(Mode::Hover, events);
            }
        } else {
            self.pinch_out_frames = DEBOUNCE_FRAMES;
            self.strokes.add_point(cursor);
        }
    }

    /// HOVER: count pinch frames toward opening a stroke.
    fn update_hover(
        &mut self,
        reading: &GestureReading,
        cursor: Point,
        events: &mut Vec<InteractionEvent>,
    ) {
        if reading.pinch_ratio < PINCH_START_RATIO {
            self.pinch_in_frames += 1;
        } else {
            self.pinch_in_frames = 0;
        }

        if self.pinch_in_frames > DEBOUNCE_FRAMES {
            self.strokes.start_stroke(cursor, &self.brush);
            self.pinch_in_frames = 0;
            self.pinch_out_frames = DEBOUNCE_FRAMES;
            self.open_palm_frames = 0;
            events.push(InteractionEvent::StrokeStarted { at: cursor });
            self.set_mode(Mode::Drawing, events);
        } else {
            self.set_mode(Mode::Hover, events);
        }
    }

    fn set_mode(&mut self, mode: Mode, events: &mut Vec<InteractionEvent>) {
        if self.mode == mode {
            return;
        }
        debug!("mode {} -> {}", self.mode.as_str(), mode.as_str());
        events.push(InteractionEvent::ModeChanged {
            from: self.mode,
            to: mode,
        });
        self.mode = mode;
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn strokes(&self) -> &StrokeAccumulator {
        &self.strokes
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn selector(&self) -> &DwellSelector {
        &self.selector
    }

    /// Snapshot for the renderer.
    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            paths: self.strokes.paths(),
            active_path: self.strokes.active_points(),
            particles: self.particles.particles(),
            mode: self.mode,
            cursor: self.cursor,
            menu_open: self.menu_open,
            brush: &self.brush,
            hovered: self.selector.hovered(),
            dwell_progress: self.selector.progress(),
        }
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        let cursor = self
            .cursor
            .map(|p| format!("({:.1} {:.1})", p.x, p.y))
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:mode :{} :menu-open {} :cursor {} :tool :{} :color {} :size {:.0} :paths {} :active-points {} :particles {} :pinch-in {} :pinch-out {} :open-palm {} :menu {})",
            self.mode.as_str(),
            if self.menu_open { "t" } else { "nil" },
            cursor,
            self.brush.tool.as_str(),
            self.brush.color_index,
            self.brush.width(),
            self.strokes.paths().len(),
            self.strokes.active_points().len(),
            self.particles.len(),
            self.pinch_in_frames,
            self.pinch_out_frames,
            self.open_palm_frames,
            self.selector.status_sexp(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
