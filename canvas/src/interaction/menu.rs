//! Dwell-based menu selection.
//!
//! The UI layer owns the menu's layout and hands in a read-only snapshot of
//! element rectangles each tick.  The selector hit-tests the cursor against
//! those rectangles in declared order and fires a selection once the cursor
//! has stayed on the same element for the dwell time.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DWELL_TIME_MS;
use crate::hand::Point;

use super::stroke::{Brush, Tool, BRUSH_SIZES, PALETTE};

// ── Element ids ────────────────────────────────────────────

/// Interactive menu elements, in hit-test order.
///
/// Only the members of [`ElementId::ALL`] are valid: `Color(0..=4)` and
/// `Size(0..=3)`.  Out-of-range indices are rejected by `is_valid` and by
/// `ElementLayout::insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Pen,
    Eraser,
    Color(u8),
    Size(u8),
}

impl ElementId {
    /// Every element in declared order; the first hit wins.
    pub const ALL: [ElementId; 11] = [
        Self::Pen,
        Self::Eraser,
        Self::Color(0),
        Self::Color(1),
        Self::Color(2),
        Self::Color(3),
        Self::Color(4),
        Self::Size(0),
        Self::Size(1),
        Self::Size(2),
        Self::Size(3),
    ];

    /// Id string used by the UI layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pen => "btn-pen",
            Self::Eraser => "btn-eraser",
            Self::Color(0) => "btn-color-0",
            Self::Color(1) => "btn-color-1",
            Self::Color(2) => "btn-color-2",
            Self::Color(3) => "btn-color-3",
            Self::Color(_) => "btn-color-4",
            Self::Size(0) => "btn-size-0",
            Self::Size(1) => "btn-size-1",
            Self::Size(2) => "btn-size-2",
            Self::Size(_) => "btn-size-3",
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Pen | Self::Eraser => true,
            Self::Color(i) => (i as usize) < PALETTE.len(),
            Self::Size(i) => (i as usize) < BRUSH_SIZES.len(),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == s)
    }

    /// Apply this element's selection to the brush.
    ///
    /// Picking a colour also switches back to the pen.
    pub fn apply(&self, brush: &mut Brush) {
        match *self {
            Self::Pen => brush.tool = Tool::Pen,
            Self::Eraser => brush.tool = Tool::Eraser,
            Self::Color(i) => {
                brush.color_index = (i as usize).min(PALETTE.len() - 1);
                brush.tool = Tool::Pen;
            }
            Self::Size(i) => brush.size_index = (i as usize).min(BRUSH_SIZES.len() - 1),
        }
    }
}

// ── Layout ─────────────────────────────────────────────────

/// Axis-aligned screen rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `p` lies inside (edges inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("unknown menu element id \"{0}\"")]
    UnknownElement(String),
}

/// Snapshot of element rectangles supplied by the UI layer.
#[derive(Debug, Clone, Default)]
pub struct ElementLayout {
    rects: HashMap<ElementId, Rect>,
}

impl ElementLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an element's rectangle.  Invalid ids are ignored.
    pub fn insert(&mut self, id: ElementId, rect: Rect) {
        if !id.is_valid() {
            warn!("ignoring out-of-range menu element {:?}", id);
            return;
        }
        self.rects.insert(id, rect);
    }

    /// Insert by the UI's string id.
    pub fn insert_named(&mut self, id: &str, rect: Rect) -> Result<(), LayoutError> {
        let element =
            ElementId::from_str(id).ok_or_else(|| LayoutError::UnknownElement(id.to_string()))?;
        self.insert(element, rect);
        Ok(())
    }

    pub fn get(&self, id: ElementId) -> Option<&Rect> {
        self.rects.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// First element, in declared order, whose rectangle contains `p`.
    pub fn hit_test(&self, p: Point) -> Option<ElementId> {
        ElementId::ALL
            .iter()
            .copied()
            .find(|id| self.rects.get(id).is_some_and(|r| r.contains(p)))
    }
}

/// A vertical toolbar down the left edge of a `width`×`height` canvas.
///
/// Used when no UI layer supplies its own layout.
pub fn default_layout(width: f32, height: f32) -> ElementLayout {
    let button = (height / 14.0).clamp(32.0, 96.0);
    let gap = button * 0.25;
    let x = (width * 0.02).max(gap);
    let mut y = gap;
    let mut layout = ElementLayout::new();
    for id in ElementId::ALL {
        layout.insert(id, Rect::new(x, y, button, button));
        y += button + gap;
    }
    layout
}

// ── Selector ───────────────────────────────────────────────

/// Dwell accumulation state.
#[derive(Debug, Clone, Default)]
pub struct DwellSelector {
    hovered: Option<ElementId>,
    elapsed_ms: f64,
}

impl DwellSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit-test `cursor` and advance the dwell timer by `dt_ms`.
    ///
    /// Returns the element when its dwell completes.  A completed dwell
    /// clears the hover so the element must be re-entered to fire again.
    pub fn update(&mut self, cursor: Point, layout: &ElementLayout, dt_ms: f64) -> Option<ElementId> {
        let Some(hit) = layout.hit_test(cursor) else {
            self.clear();
            return None;
        };

        if self.hovered != Some(hit) {
            debug!("menu hover: {}", hit.as_str());
            self.hovered = Some(hit);
            self.elapsed_ms = 0.0;
            return None;
        }

        self.elapsed_ms += dt_ms;
        if self.elapsed_ms >= DWELL_TIME_MS {
            info!("menu selection: {} after {:.0}ms", hit.as_str(), self.elapsed_ms);
            self.clear();
            return Some(hit);
        }
        None
    }

    pub fn clear(&mut self) {
        self.hovered = None;
        self.elapsed_ms = 0.0;
    }

    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Dwell progress in [0, 1] for the progress ring.
    pub fn progress(&self) -> f32 {
        (self.elapsed_ms / DWELL_TIME_MS).clamp(0.0, 1.0) as f32
    }

    pub fn status_sexp(&self) -> String {
        let hovered = self
            .hovered
            .map(|id| format!("\"{}\"", id.as_str()))
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:hovered {} :dwell-ms {:.0} :progress {:.2})",
            hovered,
            self.elapsed_ms,
            self.progress(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
