//! Intent Registry
//!
//! Holds the validated intent set in registration order. Registration order
//! is significant: it is the final tie-break when two competing intents have
//! equal priority and specificity.

use super::definition::Intent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// On-disk intent file (`[[intents]]` in TOML, `{"intents": [...]}` in JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentFile {
    #[serde(default)]
    pub intents: Vec<Intent>,
}

/// Validated, ordered intent set
#[derive(Debug, Clone, Default)]
pub struct IntentRegistry {
    intents: Vec<Arc<Intent>>,
    index: HashMap<String, usize>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an intent
    pub fn register(&mut self, intent: Intent) -> crate::Result<()> {
        intent.validate()?;
        if self.index.contains_key(&intent.id) {
            return Err(crate::Error::DuplicateIntent(intent.id));
        }
        tracing::debug!(intent = %intent.id, group = %intent.group(), "Registered intent");
        self.index.insert(intent.id.clone(), self.intents.len());
        self.intents.push(Arc::new(intent));
        Ok(())
    }

    /// Register several intents; stops at the first invalid one
    pub fn register_all(&mut self, intents: impl IntoIterator<Item = Intent>) -> crate::Result<()> {
        intents.into_iter().try_for_each(|intent| self.register(intent))
    }

    pub fn from_intents(intents: impl IntoIterator<Item = Intent>) -> crate::Result<Self> {
        let mut registry = Self::new();
        registry.register_all(intents)?;
        Ok(registry)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let file: IntentFile = toml::from_str(content).map_err(|e| crate::Error::Toml(e.to_string()))?;
        Self::from_intents(file.intents)
    }

    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        let file: IntentFile = serde_json::from_str(content)?;
        Self::from_intents(file.intents)
    }

    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            other => {
                return Err(crate::Error::Config(format!(
                    "Unsupported intent file extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };
        tracing::info!(path = %path.display(), count = registry.len(), "Loaded intents");
        Ok(registry)
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        let file = IntentFile {
            intents: self.intents.iter().map(|i| Intent::clone(i)).collect(),
        };
        toml::to_string_pretty(&file).map_err(|e| crate::Error::Toml(e.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Intent>> {
        self.index.get(id).map(|&i| &self.intents[i])
    }

    /// Registration position of an intent
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Intents in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Intent>> {
        self.intents.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.intents.iter().map(|i| i.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
