//! Action lifecycle
//!
//! Live per-hand occurrences of intents and the pure transitions between
//! pending, active and removed.

pub mod types;
pub mod tracker;

pub use types::{ActionContext, ActionKey, ActionState, ActiveAction};
pub use tracker::{
    advance_action, begin_action, end_event, lapse_action, ActionIdGenerator, ActionStore, Lapse, Observation,
};
