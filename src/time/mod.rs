//! Millisecond timing primitives
//!
//! Frame timestamps come from the upstream detection adapter as
//! milliseconds on a monotonic clock. All temporal logic in the engine
//! (durations, grace periods, velocity) is expressed in these units.

pub mod timestamp;

pub use timestamp::{Duration, Timestamp};
