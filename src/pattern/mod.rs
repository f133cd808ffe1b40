//! Declarative pattern matching
//!
//! This module turns per-hand detections into match decisions:
//! - Pattern definitions (gesture, contact, composite, bidirectional)
//! - Versioned per-finger calibration tables
//! - Pure matchers and hand-instance extraction

pub mod types;
pub mod calibration;
pub mod matcher;

pub use types::*;
pub use calibration::{CalibrationTable, FingerThresholds};
pub use matcher::{
    extract_all_matching_hands, extract_matched_hand, match_instance, matches_frame, matches_hand,
    pattern_position, HandMatch, MatchContext, DEFAULT_CONTACT_THRESHOLD, DEFAULT_GESTURE_CONFIDENCE,
};
