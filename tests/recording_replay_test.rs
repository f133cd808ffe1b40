//! Integration tests for recordings and offline replay
//!
//! Recording -> JSON file -> Load -> Replay through engine -> Report

use hand_intent::engine::{EndReason, EventPhase};
use hand_intent::frame::landmarks;
use hand_intent::frame::{HandDetection, Handedness, Landmark, HAND_LANDMARK_COUNT};
use hand_intent::intent::IntentRegistry;
use hand_intent::workflow::{replay, FrameRecording, PhaseCounts, ReplayOptions};
use hand_intent::{EngineConfig, FrameSnapshot, IntentEngine, Timestamp};
use tempfile::TempDir;

const INTENTS_JSON: &str = r#"{
    "intents": [
        {
            "id": "pinch",
            "pattern": {"type": "contact", "fingers": ["index"], "threshold": 0.05},
            "temporal": {"max_gap_ms": 50}
        }
    ]
}"#;

fn make_hand(handedness: Handedness, x: f64, gap: f64) -> HandDetection {
    let mut points = vec![Landmark::new(x, 0.5, 0.0); HAND_LANDMARK_COUNT];
    for tip in [landmarks::MIDDLE_TIP, landmarks::RING_TIP, landmarks::PINKY_TIP] {
        points[tip] = Landmark::new(x, 0.8, 0.0);
    }
    points[landmarks::INDEX_TIP] = Landmark::new(x + gap, 0.5, 0.0);
    HandDetection {
        handedness,
        hand_index: 0,
        head_index: 0,
        gesture: None,
        landmarks: points,
        world_landmarks: None,
    }
}

/// Pinch for 5 frames, one dropped frame, pinch 3 more, release for 2
fn pinch_recording() -> FrameRecording {
    let mut recording = FrameRecording::new("pinch-drag".to_string(), Some("left hand drag".to_string()));
    for i in 0..11u64 {
        let ts = Timestamp::from_millis(i * 33);
        let frame = match i {
            5 => FrameSnapshot::empty(ts),
            9 | 10 => FrameSnapshot::with_hands(ts, vec![make_hand(Handedness::Left, 0.5, 0.2)]),
            _ => FrameSnapshot::with_hands(ts, vec![make_hand(Handedness::Left, 0.3 + i as f64 * 0.02, 0.01)]),
        };
        recording.add_frame(frame);
    }
    recording.finalize();
    recording
}

fn engine() -> IntentEngine {
    let registry = IntentRegistry::from_json_str(INTENTS_JSON).expect("valid intents");
    IntentEngine::new(registry, EngineConfig::default()).expect("valid config")
}

#[test]
fn test_recording_round_trip_and_replay() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("recordings").join("pinch-drag.json");

    let recording = pinch_recording();
    assert_eq!(recording.metadata.frame_count, 11);
    assert_eq!(recording.metadata.duration_ms, 330);
    recording.save(&path).expect("Failed to save recording");

    let loaded = FrameRecording::load(&path).expect("Failed to load recording");
    assert_eq!(loaded.metadata.id, recording.metadata.id);
    assert_eq!(loaded.frames_with_hands(), 10);

    let mut engine = engine();
    let report = replay(&loaded, &mut engine, ReplayOptions::default());

    // gaps up to max_gap are bridged: the dropped frame keeps the action and
    // the release only ends it once the gap exceeds 50ms
    assert_eq!(
        report.counts_for("pinch"),
        PhaseCounts {
            start: 1,
            update: 7,
            end: 1
        }
    );
    let end = report.events.last().unwrap();
    assert_eq!(end.phase(), EventPhase::End);
    assert_eq!(end.end_reason(), Some(EndReason::Completed));
    assert_eq!(end.timestamp(), Timestamp::from_millis(330));
    assert_eq!(report.stats.actions_started, 1);
}

#[test]
fn test_replay_is_reproducible() {
    let recording = pinch_recording();
    let first = replay(&recording, &mut engine(), ReplayOptions::default());
    let second = replay(&recording, &mut engine(), ReplayOptions::default());
    assert_eq!(first.events, second.events);
}

#[test]
fn test_replay_report_serializes_events() {
    let report = replay(&pinch_recording(), &mut engine(), ReplayOptions::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["recording"], "pinch-drag");
    assert_eq!(json["frames_processed"], 11);
    assert_eq!(json["events"][0]["phase"], "start");
    assert_eq!(json["counts"]["pinch"]["update"], 7);
    assert!(json.get("stats").is_none());
}

#[test]
fn test_truncated_recording_finishes_with_timeout() {
    let mut recording = pinch_recording();
    recording.frames.truncate(3);
    recording.finalize();

    let report = replay(&recording, &mut engine(), ReplayOptions::default());
    let end = report.events.last().unwrap();
    assert_eq!(end.end_reason(), Some(EndReason::Timeout));
    assert_eq!(end.timestamp(), Timestamp::from_millis(66));
}

#[test]
fn test_load_rejects_out_of_order_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("bad.json");

    let mut recording = pinch_recording();
    recording.frames.swap(1, 4);
    recording.save(&path).unwrap();
    assert!(matches!(FrameRecording::load(&path), Err(hand_intent::Error::Recording(_))));
}

#[test]
fn test_hand_written_fixture_replays() {
    let json = r#"{
        "metadata": {"name": "empty-frames"},
        "frames": [{"timestamp": 0}, {"timestamp": 33, "hands": []}]
    }"#;
    let recording: FrameRecording = serde_json::from_str(json).unwrap();
    let report = replay(&recording, &mut engine(), ReplayOptions::default());
    assert!(report.events.is_empty());
    assert_eq!(report.frames_processed, 2);
}
