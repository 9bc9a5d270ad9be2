//! Stroke accumulation and the brush it is drawn with.
//!
//! At most one stroke is open at a time.  Finished strokes are moved
//! into the path collection and never touched again, except when the
//! whole canvas is dissolved.

use tracing::{debug, info};

use crate::config::MIN_POINT_SPACING_PX;
use crate::hand::Point;

use super::particles::Particle;

/// Every Nth point of a path becomes a particle on dissolve.
pub const DISSOLVE_SAMPLE_STRIDE: usize = 4;

// ── Brush ──────────────────────────────────────────────────

/// Drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Pen,
    Eraser,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Eraser => "eraser",
        }
    }
}

/// Swatch colours, RGBA.
pub const PALETTE: [[f32; 4]; 5] = [
    [1.0, 1.0, 1.0, 1.0],
    [1.0, 0.23, 0.19, 1.0],
    [0.2, 0.78, 0.35, 1.0],
    [0.04, 0.52, 1.0, 1.0],
    [1.0, 0.84, 0.04, 1.0],
];

/// Selectable stroke widths in pixels.
pub const BRUSH_SIZES: [f32; 4] = [3.0, 6.0, 12.0, 24.0];

/// Current tool, colour and size.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub tool: Tool,
    pub color_index: usize,
    pub size_index: usize,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color_index: 0,
            size_index: 1,
        }
    }
}

impl Brush {
    pub fn color(&self) -> [f32; 4] {
        PALETTE[self.color_index.min(PALETTE.len() - 1)]
    }

    pub fn width(&self) -> f32 {
        BRUSH_SIZES[self.size_index.min(BRUSH_SIZES.len() - 1)]
    }

    pub fn is_eraser(&self) -> bool {
        self.tool == Tool::Eraser
    }
}

// ── Paths ──────────────────────────────────────────────────

/// A finished stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingPath {
    pub points: Vec<Point>,
    pub color: [f32; 4],
    pub width: f32,
    pub is_eraser: bool,
}

/// Builds strokes and owns the finished path collection.
#[derive(Debug)]
pub struct StrokeAccumulator {
    active: Option<Vec<Point>>,
    paths: Vec<DrawingPath>,
    rng: fastrand::Rng,
}

impl Default for StrokeAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeAccumulator {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Accumulator with a caller-provided RNG for particle velocities.
    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            active: None,
            paths: Vec::new(),
            rng,
        }
    }

    /// Open a new stroke at `p`.  A stroke left open is finished first.
    pub fn start_stroke(&mut self, p: Point, brush: &Brush) {
        if self.active.is_some() {
            debug!("start_stroke with a stroke already open; finishing it");
            self.end_stroke(brush);
        }
        self.active = Some(vec![p]);
    }

    /// Append `p` if it moved more than the minimum spacing from the last
    /// recorded point.  Returns whether the point was recorded.
    pub fn add_point(&mut self, p: Point) -> bool {
        let Some(points) = self.active.as_mut() else {
            debug!("add_point with no open stroke; ignored");
            return false;
        };
        let far_enough = points
            .last()
            .map(|last| last.distance_squared(&p) > MIN_POINT_SPACING_PX * MIN_POINT_SPACING_PX)
            .unwrap_or(true);
        if far_enough {
            points.push(p);
        }
        far_enough
    }

    /// Finish the open stroke with the brush as it is now.
    ///
    /// Returns the number of points in the finished path, or `None` when
    /// there was nothing to finish.
    pub fn end_stroke(&mut self, brush: &Brush) -> Option<usize> {
        let points = self.active.take()?;
        if points.is_empty() {
            return None;
        }
        let count = points.len();
        self.paths.push(DrawingPath {
            points,
            color: brush.color(),
            width: brush.width(),
            is_eraser: brush.is_eraser(),
        });
        debug!("stroke finished: {} points, {} paths total", count, self.paths.len());
        Some(count)
    }

    /// Turn every finished path into particles and clear the canvas.
    ///
    /// Samples every fourth point of each path.  Any open stroke is
    /// discarded.  Does nothing when there are no finished paths.
    pub fn dissolve(&mut self) -> Vec<Particle> {
        if self.paths.is_empty() {
            return Vec::new();
        }
        let mut particles = Vec::new();
        for path in &self.paths {
            for p in path.points.iter().step_by(DISSOLVE_SAMPLE_STRIDE) {
                particles.push(Particle {
                    position: *p,
                    velocity: Point::new(
                        (self.rng.f32() - 0.5) * 4.0,
                        self.rng.f32() * 2.0 + 0.5,
                    ),
                    color: path.color,
                    size: path.width * (0.5 + self.rng.f32() * 0.5),
                    life: 1.0,
                });
            }
        }
        info!(
            "dissolved {} paths into {} particles",
            self.paths.len(),
            particles.len()
        );
        self.paths.clear();
        self.active = None;
        particles
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Points of the open stroke, empty when none is open.
    pub fn active_points(&self) -> &[Point] {
        self.active.as_deref().unwrap_or(&[])
    }

    pub fn paths(&self) -> &[DrawingPath] {
        &self.paths
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator() -> StrokeAccumulator {
        StrokeAccumulator::with_rng(fastrand::Rng::with_seed(7))
    }

    fn draw_line(acc: &mut StrokeAccumulator, brush: &Brush, n: usize) {
        acc.start_stroke(Point::new(0.0, 0.0), brush);
        for i in 1..n {
            acc.add_point(Point::new(i as f32 * 10.0, 0.0));
        }
        acc.end_stroke(brush);
    }

    #[test]
    fn test_start_stroke_has_one_point() {
        let mut acc = accumulator();
        acc.start_stroke(Point::new(5.0, 5.0), &Brush::default());
        assert!(acc.is_drawing());
        assert_eq!(acc.active_points(), &[Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_micro_movements_are_filtered() {
        let mut acc = accumulator();
        acc.start_stroke(Point::new(100.0, 100.0), &Brush::default());
        for (dx, dy) in [(1.0, 0.0), (0.0, 1.5), (-1.2, -1.2), (2.0, 0.0), (1.0, 1.0)] {
            assert!(!acc.add_point(Point::new(100.0 + dx, 100.0 + dy)));
        }
        assert_eq!(acc.active_points().len(), 1);
        assert!(acc.add_point(Point::new(103.0, 100.0)));
        assert_eq!(acc.active_points().len(), 2);
    }

    #[test]
    fn test_add_point_without_stroke_is_noop() {
        let mut acc = accumulator();
        assert!(!acc.add_point(Point::new(1.0, 1.0)));
        assert!(!acc.is_drawing());
        assert!(acc.paths().is_empty());
    }

    #[test]
    fn test_end_stroke_captures_brush_at_finish() {
        let mut acc = accumulator();
        let mut brush = Brush::default();
        acc.start_stroke(Point::new(0.0, 0.0), &brush);
        brush.tool = Tool::Eraser;
        brush.size_index = 3;
        assert_eq!(acc.end_stroke(&brush), Some(1));
        let path = &acc.paths()[0];
        assert!(path.is_eraser);
        assert_eq!(path.width, 24.0);
    }

    #[test]
    fn test_end_stroke_is_idempotent() {
        let mut acc = accumulator();
        let brush = Brush::default();
        acc.start_stroke(Point::new(0.0, 0.0), &brush);
        acc.add_point(Point::new(10.0, 0.0));
        assert_eq!(acc.end_stroke(&brush), Some(2));
        let before = acc.paths().to_vec();
        assert_eq!(acc.end_stroke(&brush), None);
        assert_eq!(acc.paths(), before.as_slice());
    }

    #[test]
    fn test_start_while_open_finishes_previous() {
        let mut acc = accumulator();
        let brush = Brush::default();
        acc.start_stroke(Point::new(0.0, 0.0), &brush);
        acc.add_point(Point::new(10.0, 0.0));
        acc.start_stroke(Point::new(50.0, 50.0), &brush);
        assert_eq!(acc.paths().len(), 1);
        assert_eq!(acc.paths()[0].points.len(), 2);
        assert_eq!(acc.active_points().len(), 1);
    }

    #[test]
    fn test_dissolve_samples_every_fourth_point() {
        let mut acc = accumulator();
        let brush = Brush::default();
        draw_line(&mut acc, &brush, 9); // ceil(9/4) = 3
        draw_line(&mut acc, &brush, 4); // ceil(4/4) = 1
        draw_line(&mut acc, &brush, 1); // ceil(1/4) = 1
        let particles = acc.dissolve();
        assert_eq!(particles.len(), 5);
        assert!(acc.paths().is_empty());
        assert!(particles.iter().all(|p| p.life == 1.0 && p.velocity.y > 0.0));
    }

    #[test]
    fn test_dissolve_discards_open_stroke() {
        let mut acc = accumulator();
        let brush = Brush::default();
        draw_line(&mut acc, &brush, 5);
        acc.start_stroke(Point::new(0.0, 0.0), &brush);
        let particles = acc.dissolve();
        assert_eq!(particles.len(), 2);
        assert!(!acc.is_drawing());
    }

    #[test]
    fn test_dissolve_empty_is_noop() {
        let mut acc = accumulator();
        acc.start_stroke(Point::new(0.0, 0.0), &Brush::default());
        assert!(acc.dissolve().is_empty());
        assert!(acc.is_drawing());
    }

    #[test]
    fn test_brush_defaults() {
        let brush = Brush::default();
        assert_eq!(brush.tool, Tool::Pen);
        assert_eq!(brush.color(), PALETTE[0]);
        assert_eq!(brush.width(), 6.0);
        assert!(!brush.is_eraser());
    }
}
