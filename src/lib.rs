//! # Hand Intent
//!
//! A frame-driven engine that turns per-frame hand detections into
//! semantic intent lifecycle events (start, update, end).
//!
//! ## Overview
//!
//! An upstream adapter produces one [`FrameSnapshot`] per detection cycle.
//! The engine matches every registered [`Intent`] against each detected
//! hand, tracks one action per (intent, hand) pair, resolves conflicts
//! between simultaneously matching intents, and emits typed events that
//! can be consumed directly or through the [`EventBus`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use hand_intent::{EngineConfig, EventBus, FrameSnapshot, Intent, IntentEngine, IntentRegistry, Timestamp};
//! use hand_intent::pattern::{Finger, HandSelector, Pattern};
//!
//! let registry = IntentRegistry::from_intents(vec![Intent::new(
//!     "pinch",
//!     Pattern::pinch(HandSelector::Any, &[Finger::Index], None),
//! )])
//! .expect("valid intents");
//!
//! let bus = EventBus::new();
//! bus.on("pinch:start", |event| println!("{}", event.action_id()));
//!
//! let mut engine = IntentEngine::new(registry, EngineConfig::default())
//!     .expect("valid config")
//!     .with_bus(bus);
//!
//! let events = engine.process(FrameSnapshot::empty(Timestamp::from_millis(0)));
//! assert!(events.is_empty());
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: Millisecond timestamps and durations
//! - [`frame`]: Detection snapshots and bounded frame history
//! - [`spatial`]: Grid mapping, spatial hashing and hysteresis
//! - [`pattern`]: Declarative patterns, calibration and matching
//! - [`intent`]: Intent definitions and the registry
//! - [`action`]: Per-hand action state and lifecycle transitions
//! - [`resolution`]: Conflict resolution between matching intents
//! - [`engine`]: Per-frame orchestration and lifecycle events
//! - [`dispatch`]: Typed event bus for listeners
//! - [`workflow`]: Frame recordings and offline replay
//! - [`app`]: CLI and configuration management
//!
//! ## Frame Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Frame     │───▶│   Update    │───▶│  Discovery  │───▶│ Resolution  │
//! │  Snapshot   │    │   actions   │    │  (matching) │    │ (conflicts) │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Listeners  │◀───│  Event Bus  │◀───│   Start     │◀───│  Eviction   │
//! │             │    │             │    │  winners    │    │  (preempt)  │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//! ```

pub mod time;
pub mod frame;
pub mod spatial;
pub mod pattern;
pub mod intent;
pub mod action;
pub mod resolution;
pub mod engine;
pub mod dispatch;
pub mod app;
pub mod workflow;

// Re-export commonly used types
pub use app::config::EngineConfig;
pub use dispatch::EventBus;
pub use engine::{EndReason, EventPhase, IntentEngine, IntentEvent};
pub use frame::{FrameHistory, FrameSnapshot, HandDetection, Handedness};
pub use intent::{Intent, IntentRegistry};
pub use time::{Duration, Timestamp};
pub use workflow::{FrameRecording, ReplayReport};

/// Result type alias for the intent engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the intent engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid intent '{id}': {reason}")]
    InvalidIntent { id: String, reason: String },

    #[error("Duplicate intent id: {0}")]
    DuplicateIntent(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
