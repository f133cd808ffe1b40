//! Detection frames and frame history
//!
//! This module defines the immutable snapshot produced once per detection
//! cycle and the bounded history the engine queries for temporal context.

pub mod types;
pub mod history;

pub use types::*;
pub use history::{calculate_velocity, FrameHistory, HistoryStats, DEFAULT_HISTORY_CAPACITY};
