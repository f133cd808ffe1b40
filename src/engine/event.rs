//! Intent lifecycle events
//!
//! Every action produces exactly one `Start`, zero or more `Update`s, and at
//! most one `End`. Events are immutable values; dispatch hands out shared
//! references only.

use crate::frame::types::{Handedness, Position, Velocity};
use crate::spatial::Cell;
use crate::time::{Duration, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPhase {
    Start,
    Update,
    End,
}

impl EventPhase {
    pub const ALL: [EventPhase; 3] = [EventPhase::Start, EventPhase::Update, EventPhase::End];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Start => "start",
            EventPhase::Update => "update",
            EventPhase::End => "end",
        }
    }
}

impl std::fmt::Display for EventPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// The pattern stopped matching while the hand was still tracked
    Completed,
    /// The modifier was released, or a competing intent took the hand
    Cancelled,
    /// The hand or its landmarks disappeared
    Timeout,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndReason::Completed => "completed",
            EndReason::Cancelled => "cancelled",
            EndReason::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Fields shared by every event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBase {
    pub action_id: String,
    pub intent_id: String,
    pub timestamp: Timestamp,
    pub hand: Handedness,
    pub hand_index: u8,
    pub head_index: u8,
    pub position: Position,
    pub cell: Cell,
}

/// A lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum IntentEvent {
    Start {
        #[serde(flatten)]
        base: EventBase,
    },
    Update {
        #[serde(flatten)]
        base: EventBase,
        velocity: Velocity,
        duration: Duration,
    },
    End {
        #[serde(flatten)]
        base: EventBase,
        velocity: Velocity,
        duration: Duration,
        reason: EndReason,
        /// Ended by conflict resolution rather than by its own pattern
        preempted: bool,
    },
}

impl IntentEvent {
    pub fn phase(&self) -> EventPhase {
        match self {
            IntentEvent::Start { .. } => EventPhase::Start,
            IntentEvent::Update { .. } => EventPhase::Update,
            IntentEvent::End { .. } => EventPhase::End,
        }
    }

    pub fn base(&self) -> &EventBase {
        match self {
            IntentEvent::Start { base } | IntentEvent::Update { base, .. } | IntentEvent::End { base, .. } => base,
        }
    }

    pub fn action_id(&self) -> &str {
        &self.base().action_id
    }

    pub fn intent_id(&self) -> &str {
        &self.base().intent_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.base().timestamp
    }

    pub fn hand(&self) -> Handedness {
        self.base().hand
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        match self {
            IntentEvent::End { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Dispatch key, `"<intent>:<phase>"`
    pub fn event_type(&self) -> String {
        event_type(self.intent_id(), self.phase())
    }
}

/// Build the dispatch key for an intent phase
pub fn event_type(intent_id: &str, phase: EventPhase) -> String {
    format!("{}:{}", intent_id, phase)
}
