//! Workflow Module
//!
//! Frame recordings and offline replay through the engine.

pub mod recording;
pub mod replay;

pub use recording::{FrameRecording, RecordingMetadata};
pub use replay::{replay, PhaseCounts, ReplayOptions, ReplayReport};
