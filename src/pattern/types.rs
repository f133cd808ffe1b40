//! Declarative pattern definitions
//!
//! A pattern is the match rule an intent is gated on. Patterns are plain
//! data: they are deserialized from intent files, validated once at
//! registration, and never mutated afterwards.

use crate::frame::types::{landmarks, Handedness};
use serde::{Deserialize, Serialize};

/// Which hands a pattern applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandSelector {
    Left,
    Right,
    #[default]
    Any,
}

impl HandSelector {
    pub fn accepts(&self, handedness: Handedness) -> bool {
        match self {
            HandSelector::Left => handedness == Handedness::Left,
            HandSelector::Right => handedness == Handedness::Right,
            HandSelector::Any => true,
        }
    }
}

/// Gesture classes reported by the upstream classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    #[serde(rename = "None")]
    None,
    #[serde(rename = "Closed_Fist")]
    ClosedFist,
    #[serde(rename = "Open_Palm")]
    OpenPalm,
    #[serde(rename = "Pointing_Up")]
    PointingUp,
    #[serde(rename = "Thumb_Down")]
    ThumbDown,
    #[serde(rename = "Thumb_Up")]
    ThumbUp,
    #[serde(rename = "Victory")]
    Victory,
    #[serde(rename = "ILoveYou")]
    ILoveYou,
}

impl Gesture {
    /// Classifier label for this gesture
    pub fn label(&self) -> &'static str {
        match self {
            Gesture::None => "None",
            Gesture::ClosedFist => "Closed_Fist",
            Gesture::OpenPalm => "Open_Palm",
            Gesture::PointingUp => "Pointing_Up",
            Gesture::ThumbDown => "Thumb_Down",
            Gesture::ThumbUp => "Thumb_Up",
            Gesture::Victory => "Victory",
            Gesture::ILoveYou => "ILoveYou",
        }
    }

    /// Parse a classifier label; unknown labels yield `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "None" => Some(Gesture::None),
            "Closed_Fist" => Some(Gesture::ClosedFist),
            "Open_Palm" => Some(Gesture::OpenPalm),
            "Pointing_Up" => Some(Gesture::PointingUp),
            "Thumb_Down" => Some(Gesture::ThumbDown),
            "Thumb_Up" => Some(Gesture::ThumbUp),
            "Victory" => Some(Gesture::Victory),
            "ILoveYou" => Some(Gesture::ILoveYou),
            _ => None,
        }
    }
}

/// Fingers that can touch the thumb
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Fingertip landmark index
    pub fn tip(&self) -> usize {
        match self {
            Finger::Index => landmarks::INDEX_TIP,
            Finger::Middle => landmarks::MIDDLE_TIP,
            Finger::Ring => landmarks::RING_TIP,
            Finger::Pinky => landmarks::PINKY_TIP,
        }
    }

    /// PIP, DIP and tip landmark indices
    pub fn joints(&self) -> [usize; 3] {
        let tip = self.tip();
        [tip - 2, tip - 1, tip]
    }
}

/// How thumb-to-finger contact is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    /// Thumb tip to fingertip
    #[default]
    Pinch,
    /// Thumb tip to the nearest of the finger's upper joints
    Touch,
}

/// Calibration column used when a contact pattern has no explicit threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationLevel {
    Tight,
    #[default]
    Recommended,
    Relaxed,
}

/// Gesture-class pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GesturePattern {
    #[serde(default)]
    pub hand: HandSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_index: Option<u8>,
    pub gesture: Gesture,
    /// Minimum classifier score; engine default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

/// Finger contact (pinch) pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPattern {
    #[serde(default)]
    pub hand: HandSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_index: Option<u8>,
    pub fingers: Vec<Finger>,
    #[serde(default)]
    pub contact: ContactType,
    /// Explicit distance threshold; overrides calibration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationLevel>,
}

/// Logical combinator for composite patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Several patterns evaluated against the same hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositePattern {
    #[serde(default)]
    pub operator: LogicalOperator,
    pub patterns: Vec<Pattern>,
}

/// Two-hand gate: `primary` on the acting hand, `secondary` on another hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalPattern {
    pub primary: Box<Pattern>,
    pub secondary: Box<Pattern>,
    /// Secondary must be on the hand of opposite handedness
    #[serde(default = "default_true")]
    pub require_opposite_hands: bool,
}

fn default_true() -> bool {
    true
}

/// A declarative match rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Pattern {
    Gesture(GesturePattern),
    Contact(ContactPattern),
    Composite(CompositePattern),
    Bidirectional(BidirectionalPattern),
}

impl Pattern {
    /// Shorthand for a gesture pattern with default confidence
    pub fn gesture(hand: HandSelector, gesture: Gesture) -> Self {
        Pattern::Gesture(GesturePattern {
            hand,
            hand_index: None,
            gesture,
            min_confidence: None,
        })
    }

    /// Shorthand for a thumb pinch against the given fingers
    pub fn pinch(hand: HandSelector, fingers: &[Finger], threshold: Option<f64>) -> Self {
        Pattern::Contact(ContactPattern {
            hand,
            hand_index: None,
            fingers: fingers.to_vec(),
            contact: ContactType::Pinch,
            threshold,
            calibration: None,
        })
    }

    /// Static measure of how narrowly this pattern is constrained
    pub fn specificity(&self) -> u32 {
        match self {
            Pattern::Gesture(p) => 1 + selector_specificity(p.hand, p.hand_index),
            Pattern::Contact(p) => {
                let single_finger = u32::from(p.fingers.len() == 1);
                2 + single_finger + selector_specificity(p.hand, p.hand_index)
            }
            Pattern::Composite(p) => match p.operator {
                LogicalOperator::And => p.patterns.iter().map(Pattern::specificity).sum(),
                LogicalOperator::Or => p.patterns.iter().map(Pattern::specificity).min().unwrap_or(0),
            },
            Pattern::Bidirectional(p) => 1 + p.primary.specificity() + p.secondary.specificity(),
        }
    }

    /// True when the pattern names a handedness or instance for its acting hand
    pub fn is_hand_pinned(&self) -> bool {
        match self {
            Pattern::Gesture(p) => p.hand != HandSelector::Any || p.hand_index.is_some(),
            Pattern::Contact(p) => p.hand != HandSelector::Any || p.hand_index.is_some(),
            Pattern::Composite(p) => p.patterns.iter().any(Pattern::is_hand_pinned),
            Pattern::Bidirectional(p) => p.primary.is_hand_pinned(),
        }
    }

    /// Check structural constraints; returns a description of the first problem
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Pattern::Gesture(p) => {
                check_hand_index(p.hand_index)?;
                if let Some(c) = p.min_confidence {
                    check_unit("min_confidence", c)?;
                }
                Ok(())
            }
            Pattern::Contact(p) => {
                check_hand_index(p.hand_index)?;
                if p.fingers.is_empty() {
                    return Err("contact pattern needs at least one finger".to_string());
                }
                if let Some(t) = p.threshold {
                    if !(t > 0.0 && t <= 1.0) {
                        return Err(format!("contact threshold must be in (0, 1], got {}", t));
                    }
                }
                Ok(())
            }
            Pattern::Composite(p) => {
                if p.patterns.is_empty() {
                    return Err("composite pattern needs at least one sub-pattern".to_string());
                }
                p.patterns.iter().try_for_each(Pattern::validate)
            }
            Pattern::Bidirectional(p) => {
                p.primary.validate()?;
                p.secondary.validate()
            }
        }
    }
}

fn selector_specificity(hand: HandSelector, hand_index: Option<u8>) -> u32 {
    u32::from(hand != HandSelector::Any) + u32::from(hand_index.is_some())
}

fn check_hand_index(hand_index: Option<u8>) -> std::result::Result<(), String> {
    match hand_index {
        Some(i) if i as usize >= crate::frame::types::MAX_HANDS => {
            Err(format!("hand_index must be below {}, got {}", crate::frame::types::MAX_HANDS, i))
        }
        _ => Ok(()),
    }
}

fn check_unit(name: &str, value: f64) -> std::result::Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be in [0, 1], got {}", name, value))
    }
}
