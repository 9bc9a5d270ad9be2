//! Gesture classification from hand landmarks.
//!
//! All functions here are pure.  Distances are normalized by hand size
//! (wrist → middle-finger MCP) so thresholds hold regardless of how far
//! the hand is from the camera.  Callers must only invoke these with a
//! detected hand; "no hand" is handled upstream.

use super::landmarks::{HandLandmark, Landmark, LandmarkSet};

// ── Gesture types ──────────────────────────────────────────

/// Dominant gesture of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Thumb and index tips together.
    Pinch,
    /// Four fingers extended and thumb abducted.
    OpenPalm,
    /// Index and middle extended, ring and pinky curled.
    Victory,
    /// Index extended.
    Point,
    /// Nothing recognized.
    None,
}

impl GestureKind {
    /// String representation for logging and s-expressions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pinch => "pinch",
            Self::OpenPalm => "open-palm",
            Self::Victory => "victory",
            Self::Point => "point",
            Self::None => "none",
        }
    }
}

// ── Geometry ───────────────────────────────────────────────

/// Wrist to middle-MCP distance, the per-frame scale reference.
pub fn hand_size(set: &LandmarkSet) -> f32 {
    set.distance(HandLandmark::Wrist, HandLandmark::MiddleMcp)
}

/// Index-tip to thumb-tip distance divided by hand size.
///
/// A degenerate hand size yields `f32::INFINITY`, which never reads as a pinch.
pub fn pinch_ratio(set: &LandmarkSet, hand_size: f32) -> f32 {
    if hand_size <= f32::EPSILON {
        return f32::INFINITY;
    }
    set.distance(HandLandmark::IndexTip, HandLandmark::ThumbTip) / hand_size
}

/// Midpoint of the index and thumb tips, in normalized space.
pub fn pinch_midpoint(set: &LandmarkSet) -> Landmark {
    let a = set.point(HandLandmark::IndexTip);
    let b = set.point(HandLandmark::ThumbTip);
    Landmark::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5, (a.z + b.z) * 0.5)
}

/// A finger counts as extended when its tip is farther from the wrist
/// than its PIP joint.
pub fn is_finger_extended(set: &LandmarkSet, tip: HandLandmark, pip: HandLandmark) -> bool {
    set.distance(HandLandmark::Wrist, tip) > set.distance(HandLandmark::Wrist, pip)
}

/// All four fingers extended and the thumb abducted away from the pinky.
pub fn detect_open_palm(set: &LandmarkSet) -> bool {
    let fingers_extended = HandLandmark::finger_pairs()
        .iter()
        .all(|&(tip, pip)| is_finger_extended(set, tip, pip));
    let thumb_tip_reach = set.distance(HandLandmark::ThumbTip, HandLandmark::PinkyMcp);
    let thumb_ip_reach = set.distance(HandLandmark::ThumbIp, HandLandmark::PinkyMcp);
    fingers_extended && thumb_tip_reach > thumb_ip_reach
}

/// Index and middle extended, ring and pinky curled.
pub fn detect_victory(set: &LandmarkSet) -> bool {
    is_finger_extended(set, HandLandmark::IndexTip, HandLandmark::IndexPip)
        && is_finger_extended(set, HandLandmark::MiddleTip, HandLandmark::MiddlePip)
        && !is_finger_extended(set, HandLandmark::RingTip, HandLandmark::RingPip)
        && !is_finger_extended(set, HandLandmark::PinkyTip, HandLandmark::PinkyPip)
}

// ── Per-frame reading ──────────────────────────────────────

/// Everything the interaction layer needs from one detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureReading {
    pub hand_size: f32,
    pub pinch_ratio: f32,
    /// Normalized midpoint of index and thumb tips.
    pub pinch_midpoint: Landmark,
    /// Normalized index fingertip.
    pub index_tip: Landmark,
    pub index_extended: bool,
    pub open_palm: bool,
    pub victory: bool,
}

impl GestureReading {
    /// Classify one landmark set.
    pub fn from_landmarks(set: &LandmarkSet) -> Self {
        let size = hand_size(set);
        Self {
            hand_size: size,
            pinch_ratio: pinch_ratio(set, size),
            pinch_midpoint: pinch_midpoint(set),
            index_tip: *set.point(HandLandmark::IndexTip),
            index_extended: is_finger_extended(set, HandLandmark::IndexTip, HandLandmark::IndexPip),
            open_palm: detect_open_palm(set),
            victory: detect_victory(set),
        }
    }

    /// Dominant gesture, for logging.  Pinch uses the start threshold.
    pub fn kind(&self, pinch_threshold: f32) -> GestureKind {
        if self.pinch_ratio < pinch_threshold {
            GestureKind::Pinch
        } else if self.open_palm {
            GestureKind::OpenPalm
        } else if self.victory {
            GestureKind::Victory
        } else if self.index_extended {
            GestureKind::Point
        } else {
            GestureKind::None
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
