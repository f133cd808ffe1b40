//! Event Bus
//!
//! Synchronous publish/subscribe for intent events. Listeners register on
//! one of three channels:
//!
//! - an exact event type (`"pinch:start"`)
//! - an intent id (`"pinch"`, receives start, update and end)
//! - the wildcard channel (every event)
//!
//! Delivery order per event is exact-type listeners, then intent listeners,
//! then wildcard listeners, each in subscription order. A panicking
//! listener is caught and counted; the remaining listeners still run.

use crate::engine::event::IntentEvent;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

type Listener = Arc<dyn Fn(&IntentEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Channel {
    Exact(String),
    Intent(String),
    Any,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    exact: HashMap<String, Vec<(u64, Listener)>>,
    intent: HashMap<String, Vec<(u64, Listener)>>,
    any: Vec<(u64, Listener)>,
}

impl Listeners {
    fn add(&mut self, channel: &Channel, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let list = match channel {
            Channel::Exact(key) => self.exact.entry(key.clone()).or_default(),
            Channel::Intent(key) => self.intent.entry(key.clone()).or_default(),
            Channel::Any => &mut self.any,
        };
        list.push((id, listener));
        id
    }

    fn remove(&mut self, channel: &Channel, id: u64) -> bool {
        let list = match channel {
            Channel::Exact(key) => self.exact.get_mut(key),
            Channel::Intent(key) => self.intent.get_mut(key),
            Channel::Any => Some(&mut self.any),
        };
        let Some(list) = list else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        before != list.len()
    }

    fn for_event(&self, event: &IntentEvent) -> Vec<Listener> {
        let exact = self.exact.get(&event.event_type()).into_iter().flatten();
        let intent = self.intent.get(event.intent_id()).into_iter().flatten();
        exact
            .chain(intent)
            .chain(self.any.iter())
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn count(&self) -> usize {
        self.exact.values().map(Vec::len).sum::<usize>()
            + self.intent.values().map(Vec::len).sum::<usize>()
            + self.any.len()
    }
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub events_published: u64,
    pub deliveries: u64,
    pub listener_panics: u64,
}

/// Handle returned by every subscription.
///
/// Dropping it leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    listeners: Weak<RwLock<Listeners>>,
    channel: Channel,
    id: u64,
}

impl Subscription {
    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => listeners.write().remove(&self.channel, self.id),
            None => false,
        }
    }
}

/// Cloneable handle to a shared listener registry
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Listeners>>,
    stats: Arc<Mutex<DispatchStats>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("stats", &self.stats())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to one event type, e.g. `"pinch:end"`
    pub fn on<F>(&self, event_type: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&IntentEvent) + Send + Sync + 'static,
    {
        self.subscribe(Channel::Exact(event_type.into()), Arc::new(listener))
    }

    /// Listen to every phase of one intent
    pub fn on_intent<F>(&self, intent_id: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&IntentEvent) + Send + Sync + 'static,
    {
        self.subscribe(Channel::Intent(intent_id.into()), Arc::new(listener))
    }

    /// Listen to every event
    pub fn on_any<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&IntentEvent) + Send + Sync + 'static,
    {
        self.subscribe(Channel::Any, Arc::new(listener))
    }

    fn subscribe(&self, channel: Channel, listener: Listener) -> Subscription {
        let id = self.listeners.write().add(&channel, listener);
        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            channel,
            id,
        }
    }

    /// Deliver one event; returns the number of listeners that completed
    pub fn publish(&self, event: &IntentEvent) -> usize {
        // released before any listener runs, so listeners may subscribe
        let listeners = self.listeners.read().for_event(event);

        let mut delivered = 0;
        let mut panics = 0;
        for listener in &listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    panics += 1;
                    tracing::warn!(
                        event = %event.event_type(),
                        action = %event.action_id(),
                        "Event listener panicked"
                    );
                }
            }
        }

        let mut stats = self.stats.lock();
        stats.events_published += 1;
        stats.deliveries += delivered as u64;
        stats.listener_panics += panics;
        delivered
    }

    /// Deliver events in order
    pub fn publish_all(&self, events: &[IntentEvent]) -> usize {
        events.iter().map(|event| self.publish(event)).sum()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().count()
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.lock()
    }

    /// Remove every listener
    pub fn clear(&self) {
        let mut listeners = self.listeners.write();
        listeners.exact.clear();
        listeners.intent.clear();
        listeners.any.clear();
    }
}
