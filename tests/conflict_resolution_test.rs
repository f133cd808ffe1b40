//! Integration tests for conflict resolution
//!
//! Covers the resolver on its own and as wired into the engine through
//! configuration: group limits, ranking, the global cap and custom
//! resolvers.

use hand_intent::action::ActionKey;
use hand_intent::engine::{EndReason, IntentEvent};
use hand_intent::frame::landmarks;
use hand_intent::frame::{GestureScore, HandDetection, Handedness, Landmark, Position, HAND_LANDMARK_COUNT};
use hand_intent::pattern::{Finger, Gesture, HandMatch, HandSelector, Pattern};
use hand_intent::resolution::{ConflictResolver, GroupLimit, IntentInstance, ResolutionConfig};
use hand_intent::{EngineConfig, FrameSnapshot, Intent, IntentEngine, IntentRegistry, Timestamp};
use std::sync::Arc;

/// A hand pinching thumb and index, optionally reporting a gesture
fn pinching_hand(handedness: Handedness, hand_index: u8, gesture: Option<&str>) -> HandDetection {
    let mut points = vec![Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT];
    for tip in [landmarks::MIDDLE_TIP, landmarks::RING_TIP, landmarks::PINKY_TIP] {
        points[tip] = Landmark::new(0.5, 0.8, 0.0);
    }
    points[landmarks::INDEX_TIP] = Landmark::new(0.51, 0.5, 0.0);
    HandDetection {
        handedness,
        hand_index,
        head_index: 0,
        gesture: gesture.map(|label| GestureScore {
            label: label.to_string(),
            score: 0.9,
        }),
        landmarks: points,
        world_landmarks: None,
    }
}

fn frame(ms: u64, hands: Vec<HandDetection>) -> FrameSnapshot {
    FrameSnapshot::with_hands(Timestamp::from_millis(ms), hands)
}

fn types(events: &[IntentEvent]) -> Vec<String> {
    events.iter().map(IntentEvent::event_type).collect()
}

fn pinch() -> Intent {
    Intent::new("pinch", Pattern::pinch(HandSelector::Any, &[Finger::Index], Some(0.05)))
}

fn fist() -> Intent {
    Intent::new("fist", Pattern::gesture(HandSelector::Any, Gesture::ClosedFist))
}

fn engine_with(intents: Vec<Intent>, config: EngineConfig) -> IntentEngine {
    IntentEngine::new(IntentRegistry::from_intents(intents).unwrap(), config).unwrap()
}

fn instance(intent: Intent, order: usize, handedness: Handedness, hand_index: u8) -> IntentInstance {
    IntentInstance {
        intent: Arc::new(intent),
        order,
        hand: HandMatch {
            handedness,
            hand_index,
            head_index: 0,
            position: Position::new(0.5, 0.5),
            landmarks: Vec::new(),
        },
    }
}

// ============================================================================
// Resolver
// ============================================================================

#[test]
fn test_priority_beats_specificity_and_order() {
    let mut specific = pinch().with_group("hand");
    specific.resolution.specificity = Some(10);
    let instances = vec![
        instance(specific, 0, Handedness::Left, 0),
        instance(fist().with_group("hand").with_priority(1), 1, Handedness::Left, 0),
    ];

    let resolution = ConflictResolver::default().resolve(instances);
    assert_eq!(resolution.selected.len(), 1);
    assert_eq!(resolution.selected[0].intent.id, "fist");
    assert_eq!(resolution.rejected[0].intent.id, "pinch");
}

#[test]
fn test_specificity_breaks_priority_tie() {
    let mut specific = fist().with_group("hand");
    specific.resolution.specificity = Some(9);
    let instances = vec![
        instance(pinch().with_group("hand"), 0, Handedness::Right, 0),
        instance(specific, 1, Handedness::Right, 0),
    ];

    let resolution = ConflictResolver::default().resolve(instances);
    assert_eq!(resolution.selected[0].intent.id, "fist");
}

#[test]
fn test_registration_order_breaks_full_tie() {
    let mut a = pinch().with_group("hand");
    a.resolution.specificity = Some(3);
    let mut b = fist().with_group("hand");
    b.resolution.specificity = Some(3);
    let instances = vec![
        instance(b, 1, Handedness::Left, 0),
        instance(a, 0, Handedness::Left, 0),
    ];

    let resolution = ConflictResolver::default().resolve(instances);
    assert_eq!(resolution.selected[0].intent.id, "pinch");
}

#[test]
fn test_hands_never_compete() {
    let instances = vec![
        instance(pinch().with_group("hand"), 0, Handedness::Left, 0),
        instance(fist().with_group("hand").with_priority(9), 1, Handedness::Right, 1),
    ];

    let resolution = ConflictResolver::default().resolve(instances);
    assert_eq!(resolution.selected.len(), 2);
    assert!(resolution.rejected.is_empty());
}

#[test]
fn test_top_k_group_keeps_several() {
    let mut config = ResolutionConfig::default();
    config.groups.insert("hand".to_string(), GroupLimit::top_k(2));
    let third = Intent::new("point", Pattern::gesture(HandSelector::Any, Gesture::PointingUp)).with_group("hand");
    let instances = vec![
        instance(pinch().with_group("hand").with_priority(3), 0, Handedness::Left, 0),
        instance(fist().with_group("hand").with_priority(2), 1, Handedness::Left, 0),
        instance(third, 2, Handedness::Left, 0),
    ];

    let resolution = ConflictResolver::new(config).resolve(instances);
    let ids: Vec<&str> = resolution.selected.iter().map(|i| i.intent.id.as_str()).collect();
    assert_eq!(ids, vec!["pinch", "fist"]);
    assert_eq!(resolution.rejected_keys().len(), 1);
    assert!(resolution
        .rejected_keys()
        .contains(&ActionKey::new("point", Handedness::Left, 0)));
}

#[test]
fn test_global_cap_keeps_first_selected() {
    let config = ResolutionConfig {
        max_concurrent_intents: Some(1),
        ..ResolutionConfig::default()
    };
    let instances = vec![
        instance(pinch(), 0, Handedness::Left, 0),
        instance(fist().with_priority(4), 1, Handedness::Right, 1),
    ];

    let resolution = ConflictResolver::new(config).resolve(instances);
    assert_eq!(resolution.selected.len(), 1);
    assert_eq!(resolution.selected[0].intent.id, "pinch");
    assert_eq!(resolution.rejected[0].intent.id, "fist");
}

#[test]
fn test_custom_resolver_ignores_bad_indices() {
    let resolver = ConflictResolver::default()
        .with_custom(|instances: &[IntentInstance]| vec![instances.len() + 3, 1, 1]);
    assert!(resolver.has_custom());

    let instances = vec![
        instance(pinch().with_group("hand"), 0, Handedness::Left, 0),
        instance(fist().with_group("hand"), 1, Handedness::Left, 0),
    ];
    let resolution = resolver.resolve(instances);
    assert_eq!(resolution.selected.len(), 1);
    assert_eq!(resolution.selected[0].intent.id, "fist");
    assert_eq!(resolution.rejected[0].intent.id, "pinch");
}

#[test]
fn test_resolution_is_deterministic() {
    let build = || {
        vec![
            instance(pinch().with_group("g"), 0, Handedness::Right, 1),
            instance(fist().with_group("g"), 1, Handedness::Right, 1),
            instance(pinch().with_group("g"), 0, Handedness::Left, 0),
        ]
    };
    let resolver = ConflictResolver::default();
    assert_eq!(resolver.resolve(build()), resolver.resolve(build()));
}

// ============================================================================
// Engine wiring
// ============================================================================

#[test]
fn test_engine_group_winner_takes_all() {
    let intents = vec![pinch().with_group("hand"), fist().with_group("hand").with_priority(5)];
    let mut engine = engine_with(intents, EngineConfig::default());

    let events = engine.process(frame(0, vec![pinching_hand(Handedness::Left, 0, Some("Closed_Fist"))]));
    assert_eq!(types(&events), vec!["fist:start"]);
    assert_eq!(engine.actions().len(), 1);
}

#[test]
fn test_engine_preemption_ends_with_cancel() {
    let intents = vec![pinch().with_group("hand"), fist().with_group("hand").with_priority(5)];
    let mut engine = engine_with(intents, EngineConfig::default());

    assert_eq!(
        types(&engine.process(frame(0, vec![pinching_hand(Handedness::Left, 0, None)]))),
        vec!["pinch:start"]
    );

    let events = engine.process(frame(33, vec![pinching_hand(Handedness::Left, 0, Some("Closed_Fist"))]));
    assert_eq!(types(&events), vec!["pinch:end", "fist:start"]);
    match &events[0] {
        IntentEvent::End { reason, preempted, .. } => {
            assert_eq!(*reason, EndReason::Cancelled);
            assert!(*preempted);
        }
        other => panic!("expected end, got {:?}", other),
    }
    assert_eq!(engine.stats().preemptions, 1);
}

#[test]
fn test_engine_top_k_from_config_file() {
    let toml_str = r#"
[resolution.groups.hand]
max = 2
strategy = "top-k"
"#;
    let config: EngineConfig = toml::from_str(toml_str).unwrap();
    let intents = vec![pinch().with_group("hand"), fist().with_group("hand")];
    let mut engine = engine_with(intents, config);

    let events = engine.process(frame(0, vec![pinching_hand(Handedness::Left, 0, Some("Closed_Fist"))]));
    assert_eq!(events.len(), 2);
    assert_eq!(engine.actions().active_count(), 2);
}

#[test]
fn test_engine_global_cap_across_hands() {
    let mut config = EngineConfig::default();
    config.resolution.max_concurrent_intents = Some(1);
    let mut engine = engine_with(vec![pinch()], config);

    let events = engine.process(frame(
        0,
        vec![
            pinching_hand(Handedness::Right, 1, None),
            pinching_hand(Handedness::Left, 0, None),
        ],
    ));
    assert_eq!(types(&events), vec!["pinch:start"]);
    assert_eq!(events[0].hand(), Handedness::Left);
}

#[test]
fn test_engine_custom_resolver_overrides_groups() {
    let intents = vec![pinch().with_group("hand"), fist().with_group("hand").with_priority(5)];
    let mut engine = engine_with(intents, EngineConfig::default()).with_custom_resolver(
        |instances: &[IntentInstance]| -> Vec<usize> {
            instances
                .iter()
                .enumerate()
                .filter(|(_, i)| i.intent.id == "pinch")
                .map(|(n, _)| n)
                .collect()
        },
    );

    let events = engine.process(frame(0, vec![pinching_hand(Handedness::Left, 0, Some("Closed_Fist"))]));
    assert_eq!(types(&events), vec!["pinch:start"]);
}

#[test]
fn test_invalid_resolution_config_rejected() {
    let mut config = EngineConfig::default();
    config.resolution.max_concurrent_intents = Some(0);
    let result = IntentEngine::new(IntentRegistry::new(), config);
    assert!(matches!(result, Err(hand_intent::Error::Config(_))));
}
