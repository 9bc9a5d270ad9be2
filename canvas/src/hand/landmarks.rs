//! Hand landmark model.
//!
//! A detector reports 21 points per hand: x/y normalized to the camera
//! image ([0, 1]) and z as depth relative to the wrist.  The core only
//! reads these; it never mutates a landmark set.

// ── Landmark definitions ───────────────────────────────────

/// The 21 anatomical landmarks reported per hand, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Position of this landmark in the detector output (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for logging and s-expressions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    /// (tip, pip) pairs for the four non-thumb fingers.
    pub fn finger_pairs() -> [(HandLandmark, HandLandmark); 4] {
        [
            (Self::IndexTip, Self::IndexPip),
            (Self::MiddleTip, Self::MiddlePip),
            (Self::RingTip, Self::RingPip),
            (Self::PinkyTip, Self::PinkyPip),
        ]
    }
}

// ── Points ─────────────────────────────────────────────────

/// A single landmark: normalized x/y, relative depth z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in normalized space.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A 2-D point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation toward `other` by `t`.
    pub fn lerp(&self, other: &Point, t: f32) -> Point {
        Point {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
        }
    }
}

// ── Landmark set ───────────────────────────────────────────

/// One detection of a hand: exactly 21 landmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Build a set from detector output.  Returns `None` unless there are
    /// exactly 21 points.
    pub fn from_points(points: Vec<[f32; 3]>) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            return None;
        }
        let mut set = [Landmark::default(); LANDMARK_COUNT];
        for (slot, p) in set.iter_mut().zip(points) {
            *slot = Landmark::new(p[0], p[1], p[2]);
        }
        Some(Self { points: set })
    }

    pub fn from_array(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn point(&self, landmark: HandLandmark) -> &Landmark {
        &self.points[landmark.index()]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Distance between two landmarks of this hand (normalized units).
    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> f32 {
        self.point(a).distance(self.point(b))
    }
}

/// Linear interpolation helper.
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ── Test fixtures ──────────────────────────────────────────


// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_count() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::ThumbIp.index(), 3);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::IndexPip.index(), 6);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::MiddleMcp.index(), 9);
        assert_eq!(HandLandmark::MiddlePip.index(), 10);
        assert_eq!(HandLandmark::MiddleTip.index(), 12);
        assert_eq!(HandLandmark::RingPip.index(), 14);
        assert_eq!(HandLandmark::RingTip.index(), 16);
        assert_eq!(HandLandmark::PinkyMcp.index(), 17);
        assert_eq!(HandLandmark::PinkyPip.index(), 18);
        assert_eq!(HandLandmark::PinkyTip.index(), 20);
        assert_eq!(LANDMARK_COUNT, 21);
    }

    #[test]
    fn test_from_points_rejects_wrong_count() {
        assert!(LandmarkSet::from_points(vec![[0.0; 3]; 20]).is_none());
        assert!(LandmarkSet::from_points(vec![[0.0; 3]; 22]).is_none());
        assert!(LandmarkSet::from_points(vec![[0.5; 3]; 21]).is_some());
    }

    #[test]
    fn test_from_points_keeps_order() {
        let pts: Vec<[f32; 3]> = (0..LANDMARK_COUNT)
            .map(|i| [i as f32 * 0.01, 0.5, 0.0])
            .collect();
        let set = LandmarkSet::from_points(pts).unwrap();
        assert!((set.point(HandLandmark::IndexTip).x - 0.08).abs() < 1e-6);
        assert!((set.point(HandLandmark::PinkyTip).x - 0.20).abs() < 1e-6);
    }

    #[test]
    fn test_distance() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 0.0);
        assert!((a.distance(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_point_lerp() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 20.0);
        let m = a.lerp(&b, 0.5);
        assert_eq!(m, Point::new(5.0, 10.0));
        assert!((a.distance_squared(&b) - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_landmark_as_str() {
        assert_eq!(HandLandmark::Wrist.as_str(), "wrist");
        assert_eq!(HandLandmark::ThumbTip.as_str(), "thumb-tip");
        assert_eq!(HandLandmark::PinkyMcp.as_str(), "pinky-mcp");
    }
}
