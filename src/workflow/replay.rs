//! Offline Replay
//!
//! Drives a recording through an engine frame by frame and collects what
//! came out. Used by the CLI and by fixture-based tests.

use super::recording::FrameRecording;
use crate::engine::{EngineStats, EventPhase, IntentEngine, IntentEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-intent event counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseCounts {
    pub start: usize,
    pub update: usize,
    pub end: usize,
}

impl PhaseCounts {
    fn record(&mut self, phase: EventPhase) {
        match phase {
            EventPhase::Start => self.start += 1,
            EventPhase::Update => self.update += 1,
            EventPhase::End => self.end += 1,
        }
    }
}

/// Replay settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// End still-active actions after the last frame
    pub finish: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self { finish: true }
    }
}

/// What a replay produced
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub recording: String,
    pub frames_processed: usize,
    pub events: Vec<IntentEvent>,
    pub counts: BTreeMap<String, PhaseCounts>,
    #[serde(skip)]
    pub stats: EngineStats,
}

impl ReplayReport {
    pub fn counts_for(&self, intent_id: &str) -> PhaseCounts {
        self.counts.get(intent_id).copied().unwrap_or_default()
    }

    /// Events for one intent, in emission order
    pub fn events_for<'a>(&'a self, intent_id: &'a str) -> impl Iterator<Item = &'a IntentEvent> + 'a {
        self.events.iter().filter(move |e| e.intent_id() == intent_id)
    }

    /// One line per intent
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}: {} frames, {} events\n",
            self.recording,
            self.frames_processed,
            self.events.len()
        );
        for (intent, counts) in &self.counts {
            out.push_str(&format!(
                "  {:<20} start={} update={} end={}\n",
                intent, counts.start, counts.update, counts.end
            ));
        }
        out
    }
}

/// Run every frame of `recording` through `engine`
pub fn replay(recording: &FrameRecording, engine: &mut IntentEngine, options: ReplayOptions) -> ReplayReport {
    let mut events = Vec::new();
    for frame in &recording.frames {
        events.extend(engine.process(frame.clone()));
    }
    if options.finish {
        if let Some(last) = recording.last_timestamp() {
            events.extend(engine.finish(last));
        }
    }

    let mut counts: BTreeMap<String, PhaseCounts> = BTreeMap::new();
    for event in &events {
        counts.entry(event.intent_id().to_string()).or_default().record(event.phase());
    }

    tracing::info!(
        recording = %recording.metadata.name,
        frames = recording.len(),
        events = events.len(),
        "Replay complete"
    );

    ReplayReport {
        recording: recording.metadata.name.clone(),
        frames_processed: recording.len(),
        events,
        counts,
        stats: engine.stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::EngineConfig;
    use crate::frame::types::test_support::hand_at;
    use crate::frame::{FrameSnapshot, Handedness};
    use crate::intent::{Intent, IntentRegistry};
    use crate::pattern::{Finger, HandSelector, Pattern};
    use crate::time::Timestamp;

    fn engine() -> IntentEngine {
        let registry = IntentRegistry::from_intents(vec![Intent::new(
            "pinch",
            Pattern::pinch(HandSelector::Any, &[Finger::Index], Some(0.06)),
        )])
        .unwrap();
        IntentEngine::new(registry, EngineConfig::default()).unwrap()
    }

    fn recording() -> FrameRecording {
        let frames = (0..4)
            .map(|i| {
                FrameSnapshot::with_hands(
                    Timestamp::from_millis(i * 33),
                    vec![hand_at(Handedness::Left, 0, 0.5, 0.5, 0.02)],
                )
            })
            .collect();
        FrameRecording::from_frames("held-pinch".to_string(), frames)
    }

    #[test]
    fn test_replay_counts_and_finish() {
        let mut engine = engine();
        let report = replay(&recording(), &mut engine, ReplayOptions::default());
        assert_eq!(report.frames_processed, 4);
        assert_eq!(
            report.counts_for("pinch"),
            PhaseCounts {
                start: 1,
                update: 3,
                end: 1
            }
        );
        assert!(engine.actions().is_empty());
        assert!(report.summary().contains("start=1 update=3 end=1"));
    }

    #[test]
    fn test_replay_without_finish_leaves_action_live() {
        let mut engine = engine();
        let report = replay(&recording(), &mut engine, ReplayOptions { finish: false });
        assert_eq!(report.counts_for("pinch").end, 0);
        assert_eq!(engine.actions().active_count(), 1);
        assert_eq!(report.events_for("pinch").count(), 4);
        assert_eq!(report.counts_for("missing"), PhaseCounts::default());
    }
}
