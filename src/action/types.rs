//! Action types
//!
//! An action is one live occurrence of an intent on one hand instance. The
//! `(intent, hand, hand_index)` key is unique across the store.

use crate::frame::types::{Handedness, Position, Velocity};
use crate::spatial::Cell;
use crate::time::{Duration, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle state. Ending is a same-tick transition and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionState {
    /// Matched, waiting out the intent's minimum duration
    Pending,
    /// Started; emits updates every matching frame
    Active,
}

/// Store key: one action per intent per hand instance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionKey {
    pub intent_id: String,
    pub hand: Handedness,
    pub hand_index: u8,
}

impl ActionKey {
    pub fn new(intent_id: impl Into<String>, hand: Handedness, hand_index: u8) -> Self {
        Self {
            intent_id: intent_id.into(),
            hand,
            hand_index,
        }
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.intent_id, self.hand, self.hand_index)
    }
}

/// Spatial and temporal context, refreshed on every matching frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    pub hand: Handedness,
    pub hand_index: u8,
    pub head_index: u8,
    pub position: Position,
    /// Stable (hysteresis-filtered) grid cell
    pub cell: Cell,
    pub velocity: Velocity,
    pub duration: Duration,
}

/// A live action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAction {
    pub id: String,
    pub intent_id: String,
    pub state: ActionState,
    pub start_time: Timestamp,
    /// Timestamp of the last frame the pattern matched
    pub last_update_time: Timestamp,
    pub context: ActionContext,
}

impl ActiveAction {
    pub fn key(&self) -> ActionKey {
        ActionKey::new(self.intent_id.clone(), self.context.hand, self.context.hand_index)
    }

    pub fn is_active(&self) -> bool {
        self.state == ActionState::Active
    }

    pub fn is_pending(&self) -> bool {
        self.state == ActionState::Pending
    }

    /// Time since the action was created
    pub fn elapsed(&self, now: Timestamp) -> Duration {
        now.duration_since(self.start_time)
    }

    /// Time since the pattern last matched
    pub fn gap(&self, now: Timestamp) -> Duration {
        now.duration_since(self.last_update_time)
    }
}
