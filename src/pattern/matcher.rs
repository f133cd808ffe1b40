//! Pattern Matching
//!
//! Pure predicates that decide whether a pattern is satisfied by one hand
//! in one frame. Matching is total: incomplete landmarks, unknown gesture
//! labels and absent hands all evaluate to "no match", never to an error.

use super::calibration::CalibrationTable;
use super::types::{
    BidirectionalPattern, CalibrationLevel, CompositePattern, ContactPattern, ContactType, Finger, Gesture,
    GesturePattern, HandSelector, LogicalOperator, Pattern,
};
use crate::frame::types::{landmarks, FrameSnapshot, HandDetection, Handedness, Landmark, Position};

/// Default minimum gesture classifier score
pub const DEFAULT_GESTURE_CONFIDENCE: f64 = 0.7;

/// Default thumb-to-finger distance when neither pattern nor calibration decide
pub const DEFAULT_CONTACT_THRESHOLD: f64 = 0.06;

/// Matching parameters shared by every pattern in a frame
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub calibration: Option<&'a CalibrationTable>,
    /// Column used by contact patterns that do not name one
    pub calibration_level: CalibrationLevel,
    pub gesture_confidence: f64,
    pub contact_threshold: f64,
}

impl<'a> MatchContext<'a> {
    pub fn new(calibration: Option<&'a CalibrationTable>) -> Self {
        Self {
            calibration,
            calibration_level: CalibrationLevel::Recommended,
            gesture_confidence: DEFAULT_GESTURE_CONFIDENCE,
            contact_threshold: DEFAULT_CONTACT_THRESHOLD,
        }
    }
}

impl Default for MatchContext<'static> {
    fn default() -> Self {
        Self::new(Some(CalibrationTable::builtin()))
    }
}

/// A hand that satisfied a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct HandMatch {
    pub handedness: Handedness,
    pub hand_index: u8,
    pub head_index: u8,
    /// Pattern-specific center (palm for gestures, contact point for pinches)
    pub position: Position,
    pub landmarks: Vec<Landmark>,
}

/// Does `pattern` hold for `hand` in `frame`?
pub fn matches_hand(pattern: &Pattern, hand: &HandDetection, frame: &FrameSnapshot, ctx: &MatchContext<'_>) -> bool {
    match pattern {
        Pattern::Gesture(p) => matches_gesture(p, hand, ctx),
        Pattern::Contact(p) => matches_contact(p, hand, ctx),
        Pattern::Composite(p) => matches_composite(p, hand, frame, ctx),
        Pattern::Bidirectional(p) => matches_bidirectional(p, hand, frame, ctx),
    }
}

/// Does `pattern` hold for any hand in `frame`?
pub fn matches_frame(pattern: &Pattern, frame: &FrameSnapshot, ctx: &MatchContext<'_>) -> bool {
    frame.hands().iter().any(|hand| matches_hand(pattern, hand, frame, ctx))
}

/// Every hand instance satisfying `pattern`, ordered by (handedness, index).
///
/// Bidirectional patterns yield at most one hand: the two-hand constraint
/// gates a single actor, it does not create two.
pub fn extract_all_matching_hands(frame: &FrameSnapshot, pattern: &Pattern, ctx: &MatchContext<'_>) -> Vec<HandMatch> {
    let mut hands: Vec<&HandDetection> = frame
        .hands()
        .iter()
        .filter(|hand| matches_hand(pattern, hand, frame, ctx))
        .collect();
    hands.sort_by_key(|h| (h.handedness, h.hand_index));
    hands.dedup_by_key(|h| (h.handedness, h.hand_index));

    let mut matches: Vec<HandMatch> = hands
        .into_iter()
        .filter_map(|hand| to_hand_match(pattern, hand))
        .collect();
    if matches!(pattern, Pattern::Bidirectional(_)) {
        matches.truncate(1);
    }
    matches
}

/// The single matching hand of a hand-pinned pattern
pub fn extract_matched_hand(frame: &FrameSnapshot, pattern: &Pattern, ctx: &MatchContext<'_>) -> Option<HandMatch> {
    extract_all_matching_hands(frame, pattern, ctx).into_iter().next()
}

/// Match against one specific hand instance
pub fn match_instance(
    frame: &FrameSnapshot,
    pattern: &Pattern,
    handedness: Handedness,
    hand_index: u8,
    ctx: &MatchContext<'_>,
) -> Option<HandMatch> {
    let hand = frame.find_hand(handedness, hand_index)?;
    if !matches_hand(pattern, hand, frame, ctx) {
        return None;
    }
    to_hand_match(pattern, hand)
}

/// Pattern-specific center for a hand
pub fn pattern_position(pattern: &Pattern, hand: &HandDetection) -> Option<Position> {
    match pattern {
        Pattern::Gesture(_) => hand.palm_center().or_else(|| landmark_mean(&hand.landmarks)),
        Pattern::Contact(p) => contact_point(p, hand).or_else(|| hand.palm_center()),
        Pattern::Composite(p) => p
            .patterns
            .iter()
            .find_map(|child| pattern_position(child, hand)),
        Pattern::Bidirectional(p) => pattern_position(&p.primary, hand),
    }
}

fn to_hand_match(pattern: &Pattern, hand: &HandDetection) -> Option<HandMatch> {
    let position = pattern_position(pattern, hand)?;
    Some(HandMatch {
        handedness: hand.handedness,
        hand_index: hand.hand_index,
        head_index: hand.head_index,
        position,
        landmarks: hand.landmarks.clone(),
    })
}

fn selector_ok(hand_sel: HandSelector, hand_index: Option<u8>, hand: &HandDetection) -> bool {
    hand_sel.accepts(hand.handedness) && hand_index.map_or(true, |i| i == hand.hand_index)
}

fn matches_gesture(p: &GesturePattern, hand: &HandDetection, ctx: &MatchContext<'_>) -> bool {
    if !selector_ok(p.hand, p.hand_index, hand) {
        return false;
    }
    let Some(reported) = hand.gesture.as_ref() else {
        return false;
    };
    let Some(gesture) = Gesture::from_label(&reported.label) else {
        return false;
    };
    let min_confidence = p.min_confidence.unwrap_or(ctx.gesture_confidence);
    gesture == p.gesture && reported.score >= min_confidence
}

fn matches_contact(p: &ContactPattern, hand: &HandDetection, ctx: &MatchContext<'_>) -> bool {
    if !selector_ok(p.hand, p.hand_index, hand) || !hand.has_full_landmarks() {
        return false;
    }
    let thumb = &hand.landmarks[landmarks::THUMB_TIP];
    p.fingers.iter().any(|&finger| {
        let threshold = contact_threshold(p, finger, ctx);
        finger_distance(p.contact, finger, thumb, hand)
            .map(|d| d < threshold)
            .unwrap_or(false)
    })
}

fn matches_composite(p: &CompositePattern, hand: &HandDetection, frame: &FrameSnapshot, ctx: &MatchContext<'_>) -> bool {
    if p.patterns.is_empty() {
        return false;
    }
    match p.operator {
        LogicalOperator::And => p.patterns.iter().all(|child| matches_hand(child, hand, frame, ctx)),
        LogicalOperator::Or => p.patterns.iter().any(|child| matches_hand(child, hand, frame, ctx)),
    }
}

fn matches_bidirectional(p: &BidirectionalPattern, hand: &HandDetection, frame: &FrameSnapshot, ctx: &MatchContext<'_>) -> bool {
    if !matches_hand(&p.primary, hand, frame, ctx) {
        return false;
    }
    frame.hands().iter().any(|other| {
        let same_instance = other.is_instance(hand.handedness, hand.hand_index);
        let handedness_ok = !p.require_opposite_hands || other.handedness != hand.handedness;
        !same_instance && handedness_ok && matches_hand(&p.secondary, other, frame, ctx)
    })
}

/// Explicit threshold, else calibration, else the context default
fn contact_threshold(p: &ContactPattern, finger: Finger, ctx: &MatchContext<'_>) -> f64 {
    if let Some(t) = p.threshold {
        return t;
    }
    match ctx.calibration {
        Some(table) => table.threshold(finger, p.calibration.unwrap_or(ctx.calibration_level)),
        None => ctx.contact_threshold,
    }
}

fn finger_distance(contact: ContactType, finger: Finger, thumb: &Landmark, hand: &HandDetection) -> Option<f64> {
    match contact {
        ContactType::Pinch => hand.landmark(finger.tip()).map(|tip| thumb.distance_to(tip)),
        ContactType::Touch => finger
            .joints()
            .iter()
            .filter_map(|&i| hand.landmark(i))
            .map(|lm| thumb.distance_to(lm))
            .min_by(|a, b| a.total_cmp(b)),
    }
}

/// Midpoint between the thumb tip and the closest requested finger
fn contact_point(p: &ContactPattern, hand: &HandDetection) -> Option<Position> {
    if !hand.has_full_landmarks() {
        return None;
    }
    let thumb = &hand.landmarks[landmarks::THUMB_TIP];
    let tip = p
        .fingers
        .iter()
        .filter_map(|f| hand.landmark(f.tip()))
        .min_by(|a, b| thumb.distance_to(a).total_cmp(&thumb.distance_to(b)))?;
    Some(thumb.position().midpoint(&tip.position()))
}

fn landmark_mean(points: &[Landmark]) -> Option<Position> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), lm| (sx + lm.x, sy + lm.y));
    Some(Position::new(sx / n, sy / n))
}
