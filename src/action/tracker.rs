//! Action lifecycle tracking
//!
//! `ActionStore` is a persistent map: cloning it is a reference-count bump
//! and the first write after a clone copies the table once, so a renderer
//! or recorder holding last tick's store never observes a partial update.
//!
//! The transition functions here are pure. They take the previous action
//! and the current observation and return the next action plus the event
//! to emit, leaving store bookkeeping to the orchestrator.

use super::types::{ActionContext, ActionKey, ActionState, ActiveAction};
use crate::engine::event::{EndReason, EventBase, IntentEvent};
use crate::frame::types::{Handedness, Position, Velocity};
use crate::spatial::Cell;
use crate::time::{Duration, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Produces unique, reproducible action ids.
///
/// Ids combine the action key and start time with a monotonically
/// increasing sequence, so two actions started in the same millisecond
/// for the same hand still differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionIdGenerator {
    next: u64,
}

impl ActionIdGenerator {
    pub fn new() -> Self {
        Self::seeded(1)
    }

    /// Start the sequence at `start`
    pub fn seeded(start: u64) -> Self {
        Self { next: start }
    }

    pub fn next_id(&mut self, intent_id: &str, hand: Handedness, hand_index: u8, timestamp: Timestamp) -> String {
        let sequence = self.next;
        self.next = self.next.wrapping_add(1);
        format!("{}-{}-{}-{}-{}", intent_id, hand, hand_index, timestamp.as_millis(), sequence)
    }

    /// Sequence number the next id will carry
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for ActionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy-on-write table of live actions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionStore {
    actions: Arc<BTreeMap<ActionKey, ActiveAction>>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ActionKey) -> Option<&ActiveAction> {
        self.actions.get(key)
    }

    pub fn contains(&self, key: &ActionKey) -> bool {
        self.actions.contains_key(key)
    }

    /// Actions in key order
    pub fn iter(&self) -> impl Iterator<Item = (&ActionKey, &ActiveAction)> {
        self.actions.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &ActiveAction> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.actions.values().filter(|a| a.is_active()).count()
    }

    pub fn find_by_id(&self, action_id: &str) -> Option<&ActiveAction> {
        self.actions.values().find(|a| a.id == action_id)
    }

    /// Insert or replace the action under its own key
    pub fn insert(&mut self, action: ActiveAction) -> Option<ActiveAction> {
        Arc::make_mut(&mut self.actions).insert(action.key(), action)
    }

    pub fn remove(&mut self, key: &ActionKey) -> Option<ActiveAction> {
        if !self.actions.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.actions).remove(key)
    }

    /// True when both stores share the same underlying table
    pub fn shares_table(&self, other: &ActionStore) -> bool {
        Arc::ptr_eq(&self.actions, &other.actions)
    }
}

/// Per-frame measurement of a matched hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub head_index: u8,
    pub position: Position,
    pub cell: Cell,
    pub velocity: Velocity,
}

/// What happens to an action whose pattern did not match this frame
#[derive(Debug, Clone, PartialEq)]
pub enum Lapse {
    /// Inside the grace period; keep unchanged and stay silent
    Retain,
    /// Never started; remove without an event
    Drop,
    /// Remove and emit the end event
    End(IntentEvent),
}

fn base_for(action: &ActiveAction, timestamp: Timestamp) -> EventBase {
    EventBase {
        action_id: action.id.clone(),
        intent_id: action.intent_id.clone(),
        timestamp,
        hand: action.context.hand,
        hand_index: action.context.hand_index,
        head_index: action.context.head_index,
        position: action.context.position,
        cell: action.context.cell,
    }
}

/// Create an action for a newly selected match.
///
/// Without a minimum duration the action starts immediately and the Start
/// event is returned; otherwise it waits in `Pending`.
pub fn begin_action(
    key: &ActionKey,
    observation: &Observation,
    now: Timestamp,
    min_duration: Option<Duration>,
    ids: &mut ActionIdGenerator,
) -> (ActiveAction, Option<IntentEvent>) {
    let state = if min_duration.is_some() {
        ActionState::Pending
    } else {
        ActionState::Active
    };
    let action = ActiveAction {
        id: ids.next_id(&key.intent_id, key.hand, key.hand_index, now),
        intent_id: key.intent_id.clone(),
        state,
        start_time: now,
        last_update_time: now,
        context: ActionContext {
            hand: key.hand,
            hand_index: key.hand_index,
            head_index: observation.head_index,
            position: observation.position,
            cell: observation.cell,
            velocity: Velocity::ZERO,
            duration: Duration::ZERO,
        },
    };
    let event = match state {
        ActionState::Active => Some(IntentEvent::Start {
            base: base_for(&action, now),
        }),
        ActionState::Pending => None,
    };
    (action, event)
}

/// Refresh an action whose pattern still matches.
///
/// A pending action is promoted once it has existed for `min_duration`,
/// emitting Start. An active action emits Update.
pub fn advance_action(
    action: &ActiveAction,
    observation: &Observation,
    now: Timestamp,
    min_duration: Option<Duration>,
) -> (ActiveAction, Option<IntentEvent>) {
    let mut next = action.clone();
    next.last_update_time = now;
    next.context.head_index = observation.head_index;
    next.context.position = observation.position;
    next.context.cell = observation.cell;
    next.context.velocity = observation.velocity;
    next.context.duration = action.elapsed(now);

    let event = match action.state {
        ActionState::Active => Some(IntentEvent::Update {
            base: base_for(&next, now),
            velocity: next.context.velocity,
            duration: next.context.duration,
        }),
        ActionState::Pending => {
            let held = min_duration.map_or(true, |d| next.context.duration >= d);
            if held {
                next.state = ActionState::Active;
                Some(IntentEvent::Start {
                    base: base_for(&next, now),
                })
            } else {
                None
            }
        }
    };
    (next, event)
}

/// Decide the fate of an action whose pattern stopped matching
pub fn lapse_action(action: &ActiveAction, now: Timestamp, max_gap: Option<Duration>, reason: EndReason) -> Lapse {
    if let Some(gap) = max_gap {
        if action.gap(now) <= gap {
            return Lapse::Retain;
        }
    }
    match action.state {
        ActionState::Pending => Lapse::Drop,
        ActionState::Active => Lapse::End(end_event(action, now, reason, false)),
    }
}

/// End event carrying the action's last known context
pub fn end_event(action: &ActiveAction, now: Timestamp, reason: EndReason, preempted: bool) -> IntentEvent {
    IntentEvent::End {
        base: base_for(action, now),
        velocity: action.context.velocity,
        duration: action.elapsed(now),
        reason,
        preempted,
    }
}
