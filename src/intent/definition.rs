//! Intent definitions
//!
//! An intent binds a pattern to lifecycle rules: where the acting hand maps
//! on the grid, how long the pattern must hold before the intent starts,
//! how much flicker is tolerated, and which other intents it competes with.

use crate::pattern::Pattern;
use crate::spatial::{GridConfig, GridPreset, GridPresets};
use crate::time::Duration;
use serde::{Deserialize, Serialize};

/// Grid and hysteresis settings for an intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Standard grid; engine default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridPreset>,
    /// Explicit grid dimensions; takes precedence over `grid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_grid: Option<GridConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hysteresis_threshold: Option<f64>,
}

/// Timing rules for an intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// How long the pattern must hold before Start is emitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<u64>,
    /// Grace period for a lost match before the action ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gap_ms: Option<u64>,
}

/// Conflict resolution settings for an intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    /// Intents sharing a group compete for the same hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub priority: i32,
    /// Override for the pattern-derived specificity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<u32>,
}

/// A registered intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pattern on the acting hand
    pub pattern: Pattern,
    /// Pattern that must hold on any hand for the intent to stay live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Pattern>,
    #[serde(default)]
    pub spatial: SpatialConfig,
    #[serde(default)]
    pub temporal: TemporalConfig,
    #[serde(default)]
    pub resolution: ResolutionSettings,
}

impl Intent {
    pub fn new(id: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            id: id.into(),
            description: None,
            pattern,
            modifier: None,
            spatial: SpatialConfig::default(),
            temporal: TemporalConfig::default(),
            resolution: ResolutionSettings::default(),
        }
    }

    pub fn with_modifier(mut self, modifier: Pattern) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.resolution.group = Some(group.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.resolution.priority = priority;
        self
    }

    pub fn with_min_duration(mut self, ms: u64) -> Self {
        self.temporal.min_duration_ms = Some(ms);
        self
    }

    pub fn with_max_gap(mut self, ms: u64) -> Self {
        self.temporal.max_gap_ms = Some(ms);
        self
    }

    pub fn with_grid(mut self, preset: GridPreset) -> Self {
        self.spatial.grid = Some(preset);
        self
    }

    /// Resolution group; an ungrouped intent competes only with itself
    pub fn group(&self) -> &str {
        self.resolution.group.as_deref().unwrap_or(&self.id)
    }

    pub fn priority(&self) -> i32 {
        self.resolution.priority
    }

    /// Explicit override, else the action pattern plus any modifier
    pub fn specificity(&self) -> u32 {
        self.resolution.specificity.unwrap_or_else(|| {
            self.pattern.specificity() + self.modifier.as_ref().map_or(0, Pattern::specificity)
        })
    }

    /// Grid used for this intent's cell assignment
    pub fn grid(&self, presets: &GridPresets, default: GridPreset) -> GridConfig {
        self.spatial
            .custom_grid
            .unwrap_or_else(|| presets.get(self.spatial.grid.unwrap_or(default)))
    }

    /// Minimum hold time, falling back to `default`. Zero means "start immediately".
    pub fn min_duration(&self, default: Option<u64>) -> Option<Duration> {
        self.temporal
            .min_duration_ms
            .or(default)
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn max_gap(&self, default: Option<u64>) -> Option<Duration> {
        self.temporal
            .max_gap_ms
            .or(default)
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Registration-time checks
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |reason: String| crate::Error::InvalidIntent {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".to_string()));
        }
        if self.id.contains(':') || self.id.chars().any(char::is_whitespace) {
            return Err(invalid("id must not contain ':' or whitespace".to_string()));
        }
        self.pattern.validate().map_err(|e| invalid(format!("pattern: {}", e)))?;
        if let Some(modifier) = &self.modifier {
            modifier.validate().map_err(|e| invalid(format!("modifier: {}", e)))?;
        }
        if let Some(grid) = &self.spatial.custom_grid {
            grid.validate().map_err(|e| invalid(e.to_string()))?;
        }
        if let Some(t) = self.spatial.hysteresis_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(invalid(format!("hysteresis_threshold must be in [0, 1], got {}", t)));
            }
        }
        if let Some(group) = &self.resolution.group {
            if group.trim().is_empty() {
                return Err(invalid("resolution group must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Finger, Gesture, HandSelector};

    fn pinch_intent() -> Intent {
        Intent::new("pinch", Pattern::pinch(HandSelector::Any, &[Finger::Index], None))
    }

    #[test]
    fn test_group_defaults_to_id() {
        let intent = pinch_intent();
        assert_eq!(intent.group(), "pinch");
        assert_eq!(intent.with_group("draw").group(), "draw");
    }

    #[test]
    fn test_specificity_includes_modifier() {
        let base = pinch_intent();
        let with_mod = pinch_intent().with_modifier(Pattern::gesture(HandSelector::Left, Gesture::OpenPalm));
        assert_eq!(with_mod.specificity(), base.specificity() + 2);

        let mut overridden = pinch_intent();
        overridden.resolution.specificity = Some(42);
        assert_eq!(overridden.specificity(), 42);
    }

    #[test]
    fn test_durations_fall_back_and_zero_disables() {
        let intent = pinch_intent();
        assert_eq!(intent.min_duration(None), None);
        assert_eq!(intent.min_duration(Some(100)), Some(Duration::from_millis(100)));

        let intent = pinch_intent().with_min_duration(0).with_max_gap(200);
        assert_eq!(intent.min_duration(Some(100)), None);
        assert_eq!(intent.max_gap(None), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_grid_selection() {
        let presets = GridPresets::default();
        let intent = pinch_intent();
        assert_eq!(intent.grid(&presets, GridPreset::Medium), GridConfig::MEDIUM);

        let fine = pinch_intent().with_grid(GridPreset::Fine);
        assert_eq!(fine.grid(&presets, GridPreset::Medium), GridConfig::FINE);

        let mut custom = pinch_intent().with_grid(GridPreset::Fine);
        custom.spatial.custom_grid = Some(GridConfig { cols: 3, rows: 3 });
        assert_eq!(custom.grid(&presets, GridPreset::Medium), GridConfig { cols: 3, rows: 3 });
    }

    #[test]
    fn test_validate_rejects_bad_definitions() {
        assert!(pinch_intent().validate().is_ok());

        let empty = Intent::new(" ", Pattern::gesture(HandSelector::Any, Gesture::Victory));
        assert!(empty.validate().is_err());

        let colon = Intent::new("a:b", Pattern::gesture(HandSelector::Any, Gesture::Victory));
        assert!(colon.validate().is_err());

        let mut grid = pinch_intent();
        grid.spatial.custom_grid = Some(GridConfig { cols: 0, rows: 4 });
        assert!(grid.validate().is_err());

        let mut hysteresis = pinch_intent();
        hysteresis.spatial.hysteresis_threshold = Some(1.5);
        assert!(hysteresis.validate().is_err());

        let bad_modifier = pinch_intent().with_modifier(Pattern::pinch(HandSelector::Any, &[], None));
        match bad_modifier.validate() {
            Err(crate::Error::InvalidIntent { id, reason }) => {
                assert_eq!(id, "pinch");
                assert!(reason.starts_with("modifier"));
            }
            other => panic!("Expected InvalidIntent, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml_str = r#"
id = "vortex"

[pattern]
type = "gesture"
hand = "right"
gesture = "Closed_Fist"

[temporal]
min_duration_ms = 150
max_gap_ms = 100

[resolution]
group = "spell"
priority = 10
"#;
        let intent: Intent = toml::from_str(toml_str).unwrap();
        assert_eq!(intent.id, "vortex");
        assert_eq!(intent.temporal.min_duration_ms, Some(150));
        assert_eq!(intent.group(), "spell");
        assert_eq!(intent.priority(), 10);
        assert!(intent.validate().is_ok());
    }
}
