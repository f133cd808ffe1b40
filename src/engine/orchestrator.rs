//! Engine Orchestrator
//!
//! `process_frame` is the per-frame algorithm. It is a pure function of
//! its inputs: the same frame, history, registry, action store and id
//! generator state always produce the same events and next store. The
//! previous store is never mutated.
//!
//! Phases, in order:
//!
//! 1. Update: re-match every live action against its own hand instance
//! 2. Discovery: collect every (intent, hand) instance matching this frame
//! 3. Resolution: pick winners per group and hand
//! 4. Eviction: end live actions whose instance lost resolution
//! 5. Start: create actions for selected instances not already live
//!
//! An action evicted in phase 4 emits only its End for the frame; the
//! Update produced for it in phase 1 is withdrawn.
//!
//! A two-hand (bidirectional) intent holds at most one action. While it is
//! live, discovery only offers the hand that holds it.
//!
//! `IntentEngine` wraps the function with owned state (history, store, id
//! generator) and optional dispatch to an [`EventBus`].

use super::event::{EndReason, EventPhase, IntentEvent};
use crate::action::{
    advance_action, begin_action, end_event, lapse_action, ActionIdGenerator, ActionKey, ActionStore, Lapse,
    Observation,
};
use crate::app::config::EngineConfig;
use crate::dispatch::EventBus;
use crate::frame::{calculate_velocity, FrameHistory, FrameSnapshot, Velocity};
use crate::intent::{Intent, IntentRegistry};
use crate::pattern::{
    extract_all_matching_hands, match_instance, matches_frame, pattern_position, CalibrationTable, HandMatch,
    MatchContext, Pattern,
};
use crate::resolution::{ConflictResolver, CustomResolver, IntentInstance};
use crate::spatial::{apply_hysteresis, Cell};
use crate::time::Timestamp;
use std::sync::Arc;

/// Read-only collaborators for one call to [`process_frame`]
#[derive(Debug, Clone, Copy)]
pub struct ProcessEnv<'a> {
    pub config: &'a EngineConfig,
    pub resolver: &'a ConflictResolver,
    pub calibration: &'a CalibrationTable,
}

impl<'a> ProcessEnv<'a> {
    pub fn match_context(&self) -> MatchContext<'a> {
        let matching = &self.config.matching;
        MatchContext {
            calibration: matching.use_calibration.then_some(self.calibration),
            calibration_level: matching.calibration_level,
            gesture_confidence: matching.gesture_confidence,
            contact_threshold: matching.contact_threshold,
        }
    }
}

/// Result of one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub events: Vec<IntentEvent>,
    pub actions: ActionStore,
}

/// Run one frame through the engine.
///
/// `history` must hold the frames before `frame`; the caller appends
/// `frame` afterwards. Never fails: missing data ends or skips actions.
pub fn process_frame(
    frame: &FrameSnapshot,
    history: &FrameHistory,
    registry: &IntentRegistry,
    actions: &ActionStore,
    env: &ProcessEnv<'_>,
    ids: &mut ActionIdGenerator,
) -> FrameOutcome {
    let now = frame.timestamp;
    let ctx = env.match_context();
    let temporal = &env.config.temporal;
    let mut events = Vec::new();
    let mut next = actions.clone();

    // 1. update
    for (key, action) in actions.iter() {
        let Some(intent) = registry.get(&key.intent_id) else {
            tracing::debug!(action = %action.id, intent = %key.intent_id, "Removing action for unknown intent");
            next.remove(key);
            continue;
        };

        let matched = if modifier_holds(intent, frame, &ctx) {
            match_instance(frame, &intent.pattern, key.hand, key.hand_index, &ctx)
        } else {
            None
        };

        match matched {
            Some(hand) => {
                let observation = observe(intent, &hand, frame, history, Some(action.context.cell), env);
                let (updated, event) =
                    advance_action(action, &observation, now, intent.min_duration(temporal.min_duration_ms));
                if let Some(event) = event {
                    if updated.is_active() && action.is_pending() {
                        tracing::debug!(action = %updated.id, intent = %intent.id, hand = %key.hand, "Action promoted");
                    }
                    events.push(event);
                }
                next.insert(updated);
            }
            None => {
                let reason = determine_end_reason(frame, intent, key, &ctx);
                match lapse_action(action, now, intent.max_gap(temporal.max_gap_ms), reason) {
                    Lapse::Retain => {}
                    Lapse::Drop => {
                        tracing::debug!(action = %action.id, intent = %intent.id, "Pending action dropped");
                        next.remove(key);
                    }
                    Lapse::End(event) => {
                        tracing::debug!(action = %action.id, intent = %intent.id, reason = %reason, "Action ended");
                        events.push(event);
                        next.remove(key);
                    }
                }
            }
        }
    }

    // 2. discovery
    let mut instances = Vec::new();
    for (order, intent) in registry.iter().enumerate() {
        if !modifier_holds(intent, frame, &ctx) {
            continue;
        }
        for hand in discover_hands(intent, frame, &next, &ctx) {
            instances.push(IntentInstance {
                intent: Arc::clone(intent),
                order,
                hand,
            });
        }
    }

    // 3. resolution
    let resolution = env.resolver.resolve(instances);
    let selected = resolution.selected_keys();

    // 4. eviction
    for loser in &resolution.rejected {
        let key = loser.key();
        if selected.contains(&key) {
            continue;
        }
        let Some(action) = next.remove(&key) else {
            continue;
        };
        if action.is_active() {
            tracing::debug!(action = %action.id, intent = %key.intent_id, hand = %key.hand, "Action preempted");
            events.retain(|e| !(e.phase() == EventPhase::Update && e.action_id() == action.id));
            events.push(end_event(&action, now, EndReason::Cancelled, true));
        } else {
            tracing::debug!(action = %action.id, intent = %key.intent_id, "Pending action lost resolution");
        }
    }

    // 5. start
    for instance in &resolution.selected {
        let key = instance.key();
        if next.contains(&key) {
            continue;
        }
        let intent = &instance.intent;
        let observation = observe(intent, &instance.hand, frame, history, None, env);
        let (action, event) = begin_action(
            &key,
            &observation,
            now,
            intent.min_duration(temporal.min_duration_ms),
            ids,
        );
        tracing::debug!(action = %action.id, intent = %intent.id, hand = %key.hand, state = ?action.state, "Action created");
        if let Some(event) = event {
            events.push(event);
        }
        next.insert(action);
    }

    tracing::trace!(
        timestamp = %now,
        hands = frame.hands().len(),
        events = events.len(),
        actions = next.len(),
        "Frame processed"
    );

    FrameOutcome { events, actions: next }
}

/// Why a live action stopped matching.
///
/// A released modifier cancels; a hand that vanished (or lost its
/// landmarks) times out; anything else completed normally.
pub fn determine_end_reason(frame: &FrameSnapshot, intent: &Intent, key: &ActionKey, ctx: &MatchContext<'_>) -> EndReason {
    if !modifier_holds(intent, frame, ctx) {
        return EndReason::Cancelled;
    }
    match frame.find_hand(key.hand, key.hand_index) {
        Some(hand) if hand.has_full_landmarks() => EndReason::Completed,
        _ => EndReason::Timeout,
    }
}

/// Hands offered to resolution for `intent` this frame
fn discover_hands(intent: &Intent, frame: &FrameSnapshot, live: &ActionStore, ctx: &MatchContext<'_>) -> Vec<HandMatch> {
    if !matches!(intent.pattern, Pattern::Bidirectional(_)) {
        return extract_all_matching_hands(frame, &intent.pattern, ctx);
    }
    let held: Vec<&ActionKey> = live.iter().map(|(key, _)| key).filter(|key| key.intent_id == intent.id).collect();
    if held.is_empty() {
        return extract_all_matching_hands(frame, &intent.pattern, ctx);
    }
    // the holder keeps the action; nobody else may start one
    held.into_iter()
        .find_map(|key| match_instance(frame, &intent.pattern, key.hand, key.hand_index, ctx))
        .into_iter()
        .collect()
}

fn modifier_holds(intent: &Intent, frame: &FrameSnapshot, ctx: &MatchContext<'_>) -> bool {
    intent
        .modifier
        .as_ref()
        .map_or(true, |modifier| matches_frame(modifier, frame, ctx))
}

fn observe(
    intent: &Intent,
    hand: &HandMatch,
    frame: &FrameSnapshot,
    history: &FrameHistory,
    stable: Option<Cell>,
    env: &ProcessEnv<'_>,
) -> Observation {
    let spatial = &env.config.spatial;
    let grid = intent.grid(&spatial.grid_presets, spatial.default_grid);
    let threshold = intent
        .spatial
        .hysteresis_threshold
        .unwrap_or(spatial.hysteresis_threshold);
    let cell = apply_hysteresis(hand.position, stable, &grid, threshold);

    let velocity = history.latest().map_or(Velocity::ZERO, |previous| {
        calculate_velocity(frame, previous, |f| {
            f.find_hand(hand.handedness, hand.hand_index)
                .and_then(|h| pattern_position(&intent.pattern, h))
        })
    });

    Observation {
        head_index: hand.head_index,
        position: hand.position,
        cell,
        velocity,
    }
}

/// Running counters for an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames_processed: u64,
    pub events_emitted: u64,
    pub actions_started: u64,
    pub actions_ended: u64,
    pub preemptions: u64,
    pub out_of_order_frames: u64,
}

impl EngineStats {
    fn record(&mut self, events: &[IntentEvent]) {
        self.frames_processed += 1;
        self.events_emitted += events.len() as u64;
        for event in events {
            match event {
                IntentEvent::Start { .. } => self.actions_started += 1,
                IntentEvent::Update { .. } => {}
                IntentEvent::End { preempted, .. } => {
                    self.actions_ended += 1;
                    if *preempted {
                        self.preemptions += 1;
                    }
                }
            }
        }
    }
}

/// Stateful driver owning history, live actions and the id sequence
#[derive(Debug)]
pub struct IntentEngine {
    registry: Arc<IntentRegistry>,
    config: EngineConfig,
    resolver: ConflictResolver,
    calibration: CalibrationTable,
    history: FrameHistory,
    actions: ActionStore,
    ids: ActionIdGenerator,
    bus: Option<EventBus>,
    stats: EngineStats,
}

impl IntentEngine {
    /// Build an engine; loads the configured calibration file if any
    pub fn new(registry: IntentRegistry, config: EngineConfig) -> crate::Result<Self> {
        config.validate()?;
        let calibration = match &config.matching.calibration_file {
            Some(path) => CalibrationTable::load(path)?,
            None => CalibrationTable::builtin().clone(),
        };
        tracing::debug!(
            intents = registry.len(),
            calibration = %calibration.version,
            history = config.history.capacity,
            "Engine created"
        );
        Ok(Self {
            registry: Arc::new(registry),
            resolver: ConflictResolver::new(config.resolution.clone()),
            history: FrameHistory::with_capacity(config.history.capacity),
            calibration,
            config,
            actions: ActionStore::new(),
            ids: ActionIdGenerator::new(),
            bus: None,
            stats: EngineStats::default(),
        })
    }

    pub fn with_custom_resolver(mut self, resolver: impl CustomResolver + 'static) -> Self {
        self.resolver = self.resolver.with_custom(resolver);
        self
    }

    pub fn with_calibration(mut self, calibration: CalibrationTable) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_id_generator(mut self, ids: ActionIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Publish every emitted event on `bus`
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Process one frame and return its events in emission order
    pub fn process(&mut self, frame: FrameSnapshot) -> Vec<IntentEvent> {
        if let Some(latest) = self.history.latest() {
            if latest.timestamp.is_after(frame.timestamp) {
                self.stats.out_of_order_frames += 1;
                tracing::warn!(
                    previous = %latest.timestamp,
                    timestamp = %frame.timestamp,
                    "Frame timestamp went backwards"
                );
            }
        }

        let env = ProcessEnv {
            config: &self.config,
            resolver: &self.resolver,
            calibration: &self.calibration,
        };
        let outcome = process_frame(&frame, &self.history, &self.registry, &self.actions, &env, &mut self.ids);

        self.actions = outcome.actions;
        self.history.push(frame);
        self.stats.record(&outcome.events);
        if let Some(bus) = &self.bus {
            bus.publish_all(&outcome.events);
        }
        outcome.events
    }

    /// End every active action at `timestamp` (timeout) and drop pending ones.
    /// Used when the input stream stops.
    pub fn finish(&mut self, timestamp: Timestamp) -> Vec<IntentEvent> {
        let events: Vec<IntentEvent> = self
            .actions
            .values()
            .filter(|action| action.is_active())
            .map(|action| end_event(action, timestamp, EndReason::Timeout, false))
            .collect();
        self.actions = ActionStore::new();
        for event in &events {
            self.stats.actions_ended += 1;
            self.stats.events_emitted += 1;
            if let Some(bus) = &self.bus {
                bus.publish(event);
            }
        }
        events
    }

    /// Forget all actions and history without emitting events
    pub fn reset(&mut self) {
        self.actions = ActionStore::new();
        self.history = FrameHistory::with_capacity(self.config.history.capacity);
    }

    /// Snapshot of the live actions; cheap and unaffected by later frames
    pub fn actions(&self) -> ActionStore {
        self.actions.clone()
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    pub fn bus(&self) -> Option<&EventBus> {
        self.bus.as_ref()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}
