//! Core types for detection frames
//!
//! Defines the immutable per-frame snapshot handed over by the upstream
//! detection adapter. Field names follow the adapter contract: lowercase
//! handedness, a stable `hand_index` (0-3) and `head_index` (0-1), and a
//! 21-point landmark list in normalized coordinates.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Number of landmarks in a complete hand detection
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Maximum number of simultaneously tracked hands
pub const MAX_HANDS: usize = 4;

/// Hand landmark indices
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Landmarks averaged to produce the palm center
    pub const PALM: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
}

/// Which hand a detection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// The other hand
    pub fn opposite(&self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    /// 3D Euclidean distance to another landmark
    pub fn distance_to(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Planar position
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// A normalized 2D position, nominally within `[0, 1]²`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Position) -> Position {
        Position::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Planar velocity in normalized units per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Top gesture classification reported for a hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureScore {
    /// Classifier label, e.g. `Closed_Fist`
    pub label: String,
    pub score: f64,
}

/// One detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub handedness: Handedness,
    /// Stable instance index (0-3)
    pub hand_index: u8,
    /// Index of the person this hand belongs to (0-1)
    #[serde(default)]
    pub head_index: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gesture: Option<GestureScore>,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_landmarks: Option<Vec<Landmark>>,
}

impl HandDetection {
    /// Check the landmark list is complete
    pub fn has_full_landmarks(&self) -> bool {
        self.landmarks.len() == HAND_LANDMARK_COUNT
    }

    /// Get a landmark by index
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// Average of the palm landmarks; `None` when landmarks are incomplete
    pub fn palm_center(&self) -> Option<Position> {
        if !self.has_full_landmarks() {
            return None;
        }
        let (sx, sy) = landmarks::PALM
            .iter()
            .map(|&i| &self.landmarks[i])
            .fold((0.0, 0.0), |(sx, sy), lm| (sx + lm.x, sy + lm.y));
        let n = landmarks::PALM.len() as f64;
        Some(Position::new(sx / n, sy / n))
    }

    /// Whether this detection is the given hand instance
    pub fn is_instance(&self, handedness: Handedness, hand_index: u8) -> bool {
        self.handedness == handedness && self.hand_index == hand_index
    }
}

/// Face blendshape category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blendshape {
    pub category_name: String,
    pub score: f64,
}

/// One detected face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceDetection {
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blendshapes: Option<Vec<Blendshape>>,
    /// Row-major 4x4 facial transformation matrix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_matrix: Option<Vec<f64>>,
}

/// Immutable snapshot of one detection cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceDetection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hands: Option<Vec<HandDetection>>,
}

impl FrameSnapshot {
    /// Create a frame with hand detections only
    pub fn with_hands(timestamp: Timestamp, hands: Vec<HandDetection>) -> Self {
        Self {
            timestamp,
            face: None,
            hands: Some(hands),
        }
    }

    /// Create a frame with no detections
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            face: None,
            hands: None,
        }
    }

    /// All hand detections (empty slice when none)
    pub fn hands(&self) -> &[HandDetection] {
        self.hands.as_deref().unwrap_or(&[])
    }

    /// Find a specific hand instance
    pub fn find_hand(&self, handedness: Handedness, hand_index: u8) -> Option<&HandDetection> {
        self.hands()
            .iter()
            .find(|h| h.is_instance(handedness, hand_index))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_handedness_serde_lowercase() {
        let json = serde_json::to_string(&Handedness::Left).unwrap();
        assert_eq!(json, "\"left\"");
        let parsed: Handedness = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(parsed, Handedness::Right);
        assert_eq!(Handedness::Left.opposite(), Handedness::Right);
    }

    #[test]
    fn test_landmark_distance_3d() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.03, 0.04, 0.0);
        assert!((a.distance_to(&b) - 0.05).abs() < 1e-12);
        let c = Landmark::new(0.0, 0.0, 0.05);
        assert!((a.distance_to(&c) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_palm_center_requires_full_landmarks() {
        let mut hand = hand_at(Handedness::Left, 0, 0.4, 0.6, 0.1);
        let center = hand.palm_center().expect("full hand");
        assert!((center.x - 0.4).abs() < 1e-9);
        assert!((center.y - 0.6).abs() < 1e-9);

        hand.landmarks.truncate(10);
        assert!(hand.palm_center().is_none());
    }

    #[test]
    fn test_find_hand_by_instance() {
        let frame = FrameSnapshot::with_hands(
            Timestamp::from_millis(0),
            vec![
                hand_at(Handedness::Left, 0, 0.2, 0.2, 0.1),
                hand_at(Handedness::Right, 1, 0.8, 0.2, 0.1),
            ],
        );
        assert!(frame.find_hand(Handedness::Right, 1).is_some());
        assert!(frame.find_hand(Handedness::Right, 0).is_none());
        assert_eq!(FrameSnapshot::empty(Timestamp::from_millis(0)).hands().len(), 0);
    }

    #[test]
    fn test_frame_deserializes_adapter_payload() {
        let json = r#"{
            "timestamp": 1200,
            "hands": [{
                "handedness": "left",
                "hand_index": 0,
                "head_index": 1,
                "gesture": {"label": "Closed_Fist", "score": 0.91},
                "landmarks": [{"x": 0.1, "y": 0.2, "z": 0.0}]
            }]
        }"#;
        let frame: FrameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, Timestamp::from_millis(1200));
        let hand = &frame.hands()[0];
        assert_eq!(hand.head_index, 1);
        assert!(!hand.has_full_landmarks());
        assert_eq!(hand.gesture.as_ref().unwrap().label, "Closed_Fist");
    }
}
