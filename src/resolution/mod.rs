//! Multi-instance conflict resolution

pub mod conflict;

pub use conflict::{
    ConflictResolver, CustomResolver, GroupLimit, IntentInstance, Resolution, ResolutionConfig, Strategy,
};
