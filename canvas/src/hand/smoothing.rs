//! Speed-adaptive cursor smoothing.
//!
//! A one-pole filter whose blend factor follows the frame-to-frame
//! distance: slow motion is smoothed heavily for precise menu targeting,
//! fast motion passes through almost raw so broad strokes do not lag.

use tracing::trace;

use crate::config::{SMOOTHING_MAX_ALPHA, SMOOTHING_MIN_ALPHA, SMOOTHING_SPEED_WINDOW_PX};

use super::landmarks::Point;

/// Map a frame-to-frame pixel distance onto a blend factor.
///
/// Linear from `SMOOTHING_MIN_ALPHA` at 0 px to `SMOOTHING_MAX_ALPHA` at
/// the speed window, clamped beyond it.
pub fn blend_factor(distance_px: f32) -> f32 {
    let t = (distance_px / SMOOTHING_SPEED_WINDOW_PX).clamp(0.0, 1.0);
    SMOOTHING_MIN_ALPHA + (SMOOTHING_MAX_ALPHA - SMOOTHING_MIN_ALPHA) * t
}

/// Filter state: the previous smoothed point, if any.
#[derive(Debug, Clone, Default)]
pub struct PositionFilter {
    prev: Option<Point>,
}

impl PositionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw pixel-space sample and return the smoothed position.
    pub fn filter(&mut self, raw: Point) -> Point {
        let smoothed = match self.prev {
            None => raw,
            Some(prev) => {
                let alpha = blend_factor(prev.distance(&raw));
                trace!("smoothing alpha={:.3}", alpha);
                prev.lerp(&raw, alpha)
            }
        };
        self.prev = Some(smoothed);
        smoothed
    }

    /// Last smoothed position.
    pub fn current(&self) -> Option<Point> {
        self.prev
    }

    /// Forget history; the next sample passes through unsmoothed.
    pub fn reset(&mut self) {
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut f = PositionFilter::new();
        let p = f.filter(Point::new(100.0, 200.0));
        assert_eq!(p, Point::new(100.0, 200.0));
        assert_eq!(f.current(), Some(p));
    }

    #[test]
    fn test_blend_factor_ramp() {
        assert!((blend_factor(0.0) - 0.1).abs() < 1e-6);
        assert!((blend_factor(40.0) - 0.45).abs() < 1e-6);
        assert!((blend_factor(80.0) - 0.8).abs() < 1e-6);
        assert!((blend_factor(500.0) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_slow_motion_is_smoothed_heavily() {
        let mut f = PositionFilter::new();
        f.filter(Point::new(0.0, 0.0));
        // 8 px step -> alpha = 0.1 + 0.7 * 0.1 = 0.17
        let p = f.filter(Point::new(8.0, 0.0));
        assert!((p.x - 8.0 * 0.17).abs() < 1e-4, "got {}", p.x);
    }

    #[test]
    fn test_fast_motion_is_near_raw() {
        let mut f = PositionFilter::new();
        f.filter(Point::new(0.0, 0.0));
        let p = f.filter(Point::new(200.0, 0.0));
        assert!((p.x - 160.0).abs() < 1e-3, "got {}", p.x);
    }

    #[test]
    fn test_reset() {
        let mut f = PositionFilter::new();
        f.filter(Point::new(0.0, 0.0));
        f.reset();
        assert!(f.current().is_none());
        let p = f.filter(Point::new(50.0, 50.0));
        assert_eq!(p, Point::new(50.0, 50.0));
    }
}
