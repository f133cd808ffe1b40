//! Event dispatch to external consumers

pub mod bus;

pub use bus::{DispatchStats, EventBus, Subscription};
