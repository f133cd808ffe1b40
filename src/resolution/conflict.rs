//! Conflict Resolution
//!
//! Decides which of the intent instances matching in a frame may hold an
//! action. Competition is scoped per physical hand: instances are
//! partitioned by `(group, hand, hand_index)`, so the left hand never
//! blocks the right.
//!
//! Within a partition instances are ranked by priority, then specificity,
//! then registration order. The ranking is a stable sort, so identical
//! inputs always yield identical selections.
//!
//! The global `max_concurrent_intents` cap truncates the merged selection
//! in the order it was selected: partitions in order of first appearance,
//! each partition in rank order.

use crate::action::ActionKey;
use crate::frame::types::Handedness;
use crate::intent::Intent;
use crate::pattern::HandMatch;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Selection strategy for a resolution group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Keep only the top-ranked instance
    #[default]
    WinnerTakesAll,
    /// Keep the top `max` instances
    TopK,
}

/// Per-group limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLimit {
    #[serde(default = "default_group_max")]
    pub max: usize,
    #[serde(default)]
    pub strategy: Strategy,
}

fn default_group_max() -> usize {
    1
}

impl GroupLimit {
    pub fn top_k(max: usize) -> Self {
        Self {
            max,
            strategy: Strategy::TopK,
        }
    }

    /// Instances kept per partition
    pub fn capacity(&self) -> usize {
        match self.strategy {
            Strategy::WinnerTakesAll => 1,
            Strategy::TopK => self.max,
        }
    }
}

impl Default for GroupLimit {
    fn default() -> Self {
        Self {
            max: 1,
            strategy: Strategy::WinnerTakesAll,
        }
    }
}

/// Serializable resolution settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Global cap on concurrently selected instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_intents: Option<usize>,
    /// Limits by group name; unlisted groups use winner-takes-all
    #[serde(default)]
    pub groups: BTreeMap<String, GroupLimit>,
}

impl ResolutionConfig {
    pub fn limit_for(&self, group: &str) -> GroupLimit {
        self.groups.get(group).copied().unwrap_or_default()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.max_concurrent_intents == Some(0) {
            return Err(crate::Error::Config("max_concurrent_intents must be > 0".to_string()));
        }
        for (name, limit) in &self.groups {
            if limit.max == 0 {
                return Err(crate::Error::Config(format!("group '{}' max must be > 0", name)));
            }
        }
        Ok(())
    }
}

/// One intent matching on one hand instance this frame
#[derive(Debug, Clone, PartialEq)]
pub struct IntentInstance {
    pub intent: Arc<Intent>,
    /// Registration position of the intent
    pub order: usize,
    pub hand: HandMatch,
}

impl IntentInstance {
    pub fn key(&self) -> ActionKey {
        ActionKey::new(self.intent.id.clone(), self.hand.handedness, self.hand.hand_index)
    }

    fn partition(&self) -> (&str, Handedness, u8) {
        (self.intent.group(), self.hand.handedness, self.hand.hand_index)
    }
}

/// Best first: priority, specificity, registration order, hand
fn rank(a: &IntentInstance, b: &IntentInstance) -> Ordering {
    b.intent
        .priority()
        .cmp(&a.intent.priority())
        .then_with(|| b.intent.specificity().cmp(&a.intent.specificity()))
        .then_with(|| a.order.cmp(&b.order))
        .then_with(|| (a.hand.handedness, a.hand.hand_index).cmp(&(b.hand.handedness, b.hand.hand_index)))
}

/// Caller-supplied selection over the full instance set.
///
/// Returns indices into `instances`. Out-of-range and repeated indices are
/// ignored.
pub trait CustomResolver: Send + Sync {
    fn resolve(&self, instances: &[IntentInstance]) -> Vec<usize>;
}

impl<F> CustomResolver for F
where
    F: Fn(&[IntentInstance]) -> Vec<usize> + Send + Sync,
{
    fn resolve(&self, instances: &[IntentInstance]) -> Vec<usize> {
        self(instances)
    }
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub selected: Vec<IntentInstance>,
    pub rejected: Vec<IntentInstance>,
}

impl Resolution {
    pub fn selected_keys(&self) -> BTreeSet<ActionKey> {
        self.selected.iter().map(IntentInstance::key).collect()
    }

    pub fn rejected_keys(&self) -> BTreeSet<ActionKey> {
        self.rejected.iter().map(IntentInstance::key).collect()
    }
}

/// Applies group limits, the global cap, or a custom resolver
#[derive(Clone, Default)]
pub struct ConflictResolver {
    config: ResolutionConfig,
    custom: Option<Arc<dyn CustomResolver>>,
}

impl std::fmt::Debug for ConflictResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictResolver")
            .field("config", &self.config)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl ConflictResolver {
    pub fn new(config: ResolutionConfig) -> Self {
        Self { config, custom: None }
    }

    /// Replace grouping with a custom resolver
    pub fn with_custom(mut self, resolver: impl CustomResolver + 'static) -> Self {
        self.custom = Some(Arc::new(resolver));
        self
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn has_custom(&self) -> bool {
        self.custom.is_some()
    }

    pub fn resolve(&self, instances: Vec<IntentInstance>) -> Resolution {
        let mut resolution = match &self.custom {
            Some(custom) => resolve_custom(custom.as_ref(), instances),
            None => self.resolve_grouped(instances),
        };
        if let Some(cap) = self.config.max_concurrent_intents {
            if resolution.selected.len() > cap {
                let overflow = resolution.selected.split_off(cap);
                tracing::trace!(cap, dropped = overflow.len(), "Concurrent intent cap reached");
                resolution.rejected.extend(overflow);
            }
        }
        resolution
    }

    fn resolve_grouped(&self, instances: Vec<IntentInstance>) -> Resolution {
        // partitions in order of first appearance
        let mut partitions: Vec<Vec<IntentInstance>> = Vec::new();
        let mut index: HashMap<(String, Handedness, u8), usize> = HashMap::new();
        for instance in instances {
            let (group, hand, hand_index) = instance.partition();
            let slot = *index
                .entry((group.to_string(), hand, hand_index))
                .or_insert_with(|| {
                    partitions.push(Vec::new());
                    partitions.len() - 1
                });
            partitions[slot].push(instance);
        }

        let mut resolution = Resolution::default();
        for mut members in partitions {
            members.sort_by(rank);
            let capacity = self.config.limit_for(members[0].intent.group()).capacity();
            let losers = members.split_off(capacity.min(members.len()));
            resolution.selected.extend(members);
            resolution.rejected.extend(losers);
        }
        resolution
    }
}

fn resolve_custom(custom: &dyn CustomResolver, instances: Vec<IntentInstance>) -> Resolution {
    let picks = custom.resolve(&instances);
    let mut taken = vec![false; instances.len()];
    let mut order = Vec::new();
    for i in picks {
        if i < instances.len() && !taken[i] {
            taken[i] = true;
            order.push(i);
        }
    }

    let mut slots: Vec<Option<IntentInstance>> = instances.into_iter().map(Some).collect();
    let selected = order.iter().filter_map(|&i| slots[i].take()).collect();
    let rejected = slots.into_iter().flatten().collect();
    Resolution { selected, rejected }
}
