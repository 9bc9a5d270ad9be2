//! Landmark recordings and the replay camera/detector pair.
//!
//! A recording is one s-expression plist per line:
//!
//! ```text
//! ; comment
//! (:t 0 :hand ((0.51 0.62 -0.01) (0.48 0.58 -0.02) ...))
//! (:t 33 :hand nil)
//! ```
//!
//! `:hand` holds 21 `(x y z)` triples in landmark order, or `nil` for a
//! frame where no hand was detected.

use std::path::Path;
use std::sync::Arc;

use lexpr::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CanvasConfig;
use crate::hand::{LandmarkSet, LANDMARK_COUNT};

use super::session::{CameraSource, DetectorError, Frame, LandmarkDetector, SessionError};

/// Errors reading a recording.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: malformed s-expression: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: missing :{key}")]
    MissingKey { line: usize, key: &'static str },
    #[error("line {line}: expected 21 landmarks, found {found}")]
    LandmarkCount { line: usize, found: usize },
    #[error("line {line}: landmark {index} is not an (x y z) number triple")]
    BadLandmark { line: usize, index: usize },
}

/// One recorded detection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub t_ms: f64,
    pub hand: Option<LandmarkSet>,
}

/// A parsed recording.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn parse(text: &str) -> Result<Self, RecordingError> {
        let mut frames = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }
            frames.push(parse_frame(trimmed, line)?);
        }
        Ok(Self { frames })
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let text = std::fs::read_to_string(path).map_err(|source| RecordingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let recording = Self::parse(&text)?;
        info!(
            "loaded recording {} ({} frames, {} with a hand)",
            path.display(),
            recording.len(),
            recording.frames.iter().filter(|f| f.hand.is_some()).count()
        );
        Ok(recording)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Split into a camera that replays the frame sequence and a detector
    /// that answers with the recorded hands.
    pub fn into_sources(self) -> (ReplayCamera, ReplayDetector) {
        let frames: Arc<[RecordedFrame]> = self.frames.into();
        (
            ReplayCamera {
                frames: Arc::clone(&frames),
                next: 0,
                open: false,
            },
            ReplayDetector { frames },
        )
    }
}

fn parse_frame(text: &str, line: usize) -> Result<RecordedFrame, RecordingError> {
    let value = lexpr::from_str(text).map_err(|e| RecordingError::Parse {
        line,
        message: e.to_string(),
    })?;

    let t_ms = plist_get(&value, "t")
        .and_then(Value::as_f64)
        .ok_or(RecordingError::MissingKey { line, key: "t" })?;
    let hand = plist_get(&value, "hand").ok_or(RecordingError::MissingKey { line, key: "hand" })?;

    if is_nil(hand) {
        return Ok(RecordedFrame { t_ms, hand: None });
    }

    let triples = list_items(hand);
    if triples.len() != LANDMARK_COUNT {
        return Err(RecordingError::LandmarkCount {
            line,
            found: triples.len(),
        });
    }
    let mut points = Vec::with_capacity(LANDMARK_COUNT);
    for (index, triple) in triples.into_iter().enumerate() {
        let coords: Vec<f32> = list_items(triple)
            .into_iter()
            .filter_map(|v| v.as_f64().map(|n| n as f32))
            .collect();
        match coords.as_slice() {
            [x, y, z] => points.push([*x, *y, *z]),
            _ => return Err(RecordingError::BadLandmark { line, index }),
        }
    }
    let hand = LandmarkSet::from_points(points).ok_or(RecordingError::LandmarkCount {
        line,
        found: LANDMARK_COUNT,
    })?;
    Ok(RecordedFrame {
        t_ms,
        hand: Some(hand),
    })
}

/// Value following `:key` in a plist.  Accepts both keyword and
/// `:`-prefixed symbol spellings.
fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                let is_key = match pair.car() {
                    Value::Keyword(k) => k.as_ref() == key,
                    Value::Symbol(s) => s.as_ref() == prefixed,
                    _ => false,
                };
                if is_key {
                    return match pair.cdr() {
                        Value::Cons(next) => Some(next.car()),
                        _ => None,
                    };
                }
                current = pair.cdr();
            }
            _ => return None,
        }
    }
}

fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null | Value::Bool(false) => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Top-level elements of a proper list or vector.
fn list_items(value: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Vector(elems) => {
                items.extend(elems.iter());
                break;
            }
            _ => break,
        }
    }
    items
}

// ── Replay sources ─────────────────────────────────────────

/// Camera that emits one frame per recorded cycle.
#[derive(Debug)]
pub struct ReplayCamera {
    frames: Arc<[RecordedFrame]>,
    next: usize,
    open: bool,
}

impl CameraSource for ReplayCamera {
    fn open(&mut self, _config: &CanvasConfig) -> Result<(), SessionError> {
        if self.open {
            return Err(SessionError::Camera("replay camera already open".into()));
        }
        self.open = true;
        self.next = 0;
        Ok(())
    }

    fn grab(&mut self) -> Option<Frame> {
        if !self.open {
            return None;
        }
        let recorded = self.frames.get(self.next)?;
        let frame = Frame {
            sequence: self.next as u64,
            timestamp_ms: recorded.t_ms,
            ..Frame::default()
        };
        self.next += 1;
        Some(frame)
    }

    fn release(&mut self) {
        self.open = false;
        debug!("replay camera released at frame {}/{}", self.next, self.frames.len());
    }

    fn is_exhausted(&self) -> bool {
        self.next >= self.frames.len()
    }
}

/// Detector that looks up the recorded hand for a frame's sequence number.
#[derive(Debug)]
pub struct ReplayDetector {
    frames: Arc<[RecordedFrame]>,
}

impl LandmarkDetector for ReplayDetector {
    fn load(&mut self) -> Result<(), DetectorError> {
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, DetectorError> {
        let recorded = usize::try_from(frame.sequence)
            .ok()
            .and_then(|i| self.frames.get(i))
            .ok_or_else(|| {
                DetectorError::Inference(format!("frame {} not in recording", frame.sequence))
            })?;
        Ok(recorded.hand.clone())
    }
}

/// Format a landmark set as a recording line.
pub fn format_frame(t_ms: f64, hand: Option<&LandmarkSet>) -> String {
    match hand {
        None => format!("(:t {} :hand nil)", t_ms),
        Some(set) => {
            let triples: Vec<String> = set
                .points()
                .iter()
                .map(|p| format!("({} {} {})", p.x, p.y, p.z))
                .collect();
            format!("(:t {} :hand ({}))", t_ms, triples.join(" "))
        }
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::landmarks::fixtures;
    use crate::hand::HandLandmark;

    fn hand_line(t: f64) -> String {
        format_frame(t, Some(&fixtures::relaxed_at(0.5, 0.5)))
    }

    #[test]
    fn test_parse_hand_and_nil() {
        let text = format!(
            "; captured at 30Hz\n\n{}\n(:t 33 :hand nil)\n",
            hand_line(0.0)
        );
        let rec = Recording::parse(&text).unwrap();
        assert_eq!(rec.len(), 2);
        let hand = rec.frames[0].hand.as_ref().unwrap();
        let wrist = hand.point(HandLandmark::Wrist);
        assert!((wrist.x - 0.5).abs() < 1e-5);
        assert!((wrist.y - 0.6).abs() < 1e-5);
        assert!(rec.frames[1].hand.is_none());
        assert!((rec.frames[1].t_ms - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_landmark_count() {
        let err = Recording::parse("(:t 0 :hand ((0.1 0.2 0.0) (0.3 0.4 0.0)))").unwrap_err();
        assert!(matches!(err, RecordingError::LandmarkCount { line: 1, found: 2 }));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let good = hand_line(0.0);
        let bad = good.replacen("(0.5 0.6 0)", "(0.5 oops 0)", 1);
        assert_ne!(good, bad);
        let text = format!("{}\n{}", good, bad);
        let err = Recording::parse(&text).unwrap_err();
        assert!(matches!(err, RecordingError::BadLandmark { line: 2, index: 0 }));
    }

    #[test]
    fn test_missing_keys() {
        let err = Recording::parse("(:hand nil)").unwrap_err();
        assert!(matches!(err, RecordingError::MissingKey { key: "t", .. }));
        let err = Recording::parse("(:t 5)").unwrap_err();
        assert!(matches!(err, RecordingError::MissingKey { key: "hand", .. }));
    }

    #[test]
    fn test_malformed_sexp() {
        let err = Recording::parse("(:t 0 :hand").unwrap_err();
        assert!(matches!(err, RecordingError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_demo_recording() {
        let rec = Recording::parse(include_str!("../../../demos/diagonal-stroke.sexp")).unwrap();
        assert_eq!(rec.len(), 45);
        assert!(rec.frames[..42].iter().all(|f| f.hand.is_some()));
        assert!(rec.frames[42..].iter().all(|f| f.hand.is_none()));
    }

    #[test]
    fn test_replay_sources() {
        let text = format!("{}\n(:t 33 :hand nil)", hand_line(0.0));
        let (mut camera, mut detector) = Recording::parse(&text).unwrap().into_sources();
        assert!(camera.grab().is_none());
        camera.open(&CanvasConfig::default()).unwrap();

        let first = camera.grab().unwrap();
        assert!(detector.detect(&first).unwrap().is_some());
        let second = camera.grab().unwrap();
        assert!((second.timestamp_ms - 33.0).abs() < 1e-9);
        assert!(detector.detect(&second).unwrap().is_none());
        assert!(camera.grab().is_none());
        assert!(camera.is_exhausted());

        assert!(detector.detect(&Frame::empty(7)).is_err());
    }
}
