//! Interaction thresholds and canvas geometry.
//!
//! The thresholds are fixed constants; only the canvas geometry and the
//! tick rate are chosen at startup.

// ── Gesture thresholds ─────────────────────────────────────

/// Pinch ratio below which a frame counts toward starting a stroke.
pub const PINCH_START_RATIO: f32 = 0.09;

/// Pinch ratio above which a frame counts toward ending a stroke.
/// Higher than the start ratio so the two form a hysteresis band.
pub const PINCH_END_RATIO: f32 = 0.14;

/// Consecutive frames a pinch must be held (strictly more than this) to
/// start drawing, and the ceiling of the exit counter while drawing.
pub const DEBOUNCE_FRAMES: i32 = 3;

/// Consecutive open-palm frames (strictly more than this) to toggle the menu.
pub const OPEN_PALM_CONFIRM_FRAMES: u32 = 5;

/// Minimum time between two menu toggles.
pub const MENU_TOGGLE_COOLDOWN_MS: f64 = 1000.0;

// ── Stroke / menu ──────────────────────────────────────────

/// Minimum spacing between recorded stroke points, in pixels.
pub const MIN_POINT_SPACING_PX: f32 = 2.0;

/// Sustained hover required to select a menu element.
pub const DWELL_TIME_MS: f64 = 600.0;

// ── Position filter ────────────────────────────────────────

/// Normalized margin on each edge of the camera frame that is distrusted.
pub const SAFE_ZONE_MARGIN: f32 = 0.05;

/// Blend factor used for very slow motion (heavy smoothing).
pub const SMOOTHING_MIN_ALPHA: f32 = 0.1;

/// Blend factor used at and above the speed window (near-raw).
pub const SMOOTHING_MAX_ALPHA: f32 = 0.8;

/// Frame-to-frame distance, in pixels, at which the maximum blend is reached.
pub const SMOOTHING_SPEED_WINDOW_PX: f32 = 80.0;

// ── Runtime ────────────────────────────────────────────────

/// Target tick rate of the interaction loop.
pub const TARGET_TICK_HZ: f64 = 30.0;

/// Canvas geometry and tick cadence.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    /// Mirror the camera image horizontally (selfie view).
    pub mirror: bool,
    /// Target ticks per second.
    pub tick_hz: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            mirror: true,
            tick_hz: TARGET_TICK_HZ,
        }
    }
}

impl CanvasConfig {
    /// Convert a normalized landmark coordinate into canvas pixels.
    ///
    /// This is the only place normalized and pixel space meet.
    pub fn to_pixels(&self, x: f32, y: f32) -> (f32, f32) {
        let x = if self.mirror { 1.0 - x } else { x };
        (x * self.width, y * self.height)
    }

    /// Target interval between ticks in milliseconds.
    pub fn tick_interval_ms(&self) -> f64 {
        if self.tick_hz > 0.0 {
            1000.0 / self.tick_hz
        } else {
            1000.0 / TARGET_TICK_HZ
        }
    }
}

/// Whether a normalized point lies inside the trusted central region.
pub fn in_safe_zone(x: f32, y: f32) -> bool {
    let lo = SAFE_ZONE_MARGIN;
    let hi = 1.0 - SAFE_ZONE_MARGIN;
    (lo..=hi).contains(&x) && (lo..=hi).contains(&y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hysteresis_band_is_open() {
        assert!(PINCH_START_RATIO < PINCH_END_RATIO);
    }

    #[test]
    fn test_to_pixels_mirrored() {
        let cfg = CanvasConfig::default();
        let (x, y) = cfg.to_pixels(0.25, 0.5);
        assert!((x - 960.0).abs() < 0.001);
        assert!((y - 360.0).abs() < 0.001);
    }

    #[test]
    fn test_to_pixels_unmirrored() {
        let cfg = CanvasConfig {
            mirror: false,
            ..CanvasConfig::default()
        };
        let (x, _) = cfg.to_pixels(0.25, 0.5);
        assert!((x - 320.0).abs() < 0.001);
    }

    #[test]
    fn test_safe_zone_edges() {
        assert!(in_safe_zone(0.5, 0.5));
        assert!(in_safe_zone(0.06, 0.94));
        assert!(!in_safe_zone(0.04, 0.5));
        assert!(!in_safe_zone(0.5, 0.96));
    }

    #[test]
    fn test_tick_interval() {
        let cfg = CanvasConfig::default();
        assert!((cfg.tick_interval_ms() - 33.333).abs() < 0.01);
        let zero = CanvasConfig {
            tick_hz: 0.0,
            ..CanvasConfig::default()
        };
        assert!((zero.tick_interval_ms() - 33.333).abs() < 0.01);
    }
}
