//! Intent engine
//!
//! The per-frame orchestrator and the lifecycle events it emits.

pub mod event;
pub mod orchestrator;

pub use event::{event_type, EndReason, EventBase, EventPhase, IntentEvent};
pub use orchestrator::{determine_end_reason, process_frame, EngineStats, FrameOutcome, IntentEngine, ProcessEnv};
