//! Intent definitions and registry

pub mod definition;
pub mod registry;

pub use definition::{Intent, ResolutionSettings, SpatialConfig, TemporalConfig};
pub use registry::{IntentFile, IntentRegistry};
