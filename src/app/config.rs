//! Configuration Management

use crate::frame::DEFAULT_HISTORY_CAPACITY;
use crate::pattern::{CalibrationLevel, DEFAULT_CONTACT_THRESHOLD, DEFAULT_GESTURE_CONFIDENCE};
use crate::resolution::ResolutionConfig;
use crate::spatial::{GridPreset, GridPresets, DEFAULT_HYSTERESIS_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Frame history settings
    #[serde(default)]
    pub history: HistoryConfig,
    /// Grid and hysteresis defaults
    #[serde(default)]
    pub spatial: SpatialDefaults,
    /// Default timing for intents that do not set their own
    #[serde(default)]
    pub temporal: TemporalDefaults,
    /// Group limits and global cap
    #[serde(default)]
    pub resolution: ResolutionConfig,
    /// Matcher thresholds
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Frame history configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Frames retained (300 is roughly ten seconds at 30 fps)
    pub capacity: usize,
}

/// Spatial configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialDefaults {
    /// Grid for intents without a spatial override
    pub default_grid: GridPreset,
    /// Stable-cell stickiness radius in normalized units
    pub hysteresis_threshold: f64,
    /// Dimensions behind the three presets
    #[serde(default)]
    pub grid_presets: GridPresets,
}

/// Temporal defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gap_ms: Option<u64>,
}

/// Matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum gesture score when a pattern does not set one
    pub gesture_confidence: f64,
    /// Contact distance used when calibration is disabled
    pub contact_threshold: f64,
    /// Resolve contact thresholds from the calibration table
    pub use_calibration: bool,
    /// Calibration column for patterns that do not name one
    #[serde(default)]
    pub calibration_level: CalibrationLevel,
    /// JSON calibration table replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_file: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Default for SpatialDefaults {
    fn default() -> Self {
        Self {
            default_grid: GridPreset::Medium,
            hysteresis_threshold: DEFAULT_HYSTERESIS_THRESHOLD,
            grid_presets: GridPresets::default(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            gesture_confidence: DEFAULT_GESTURE_CONFIDENCE,
            contact_threshold: DEFAULT_CONTACT_THRESHOLD,
            use_calibration: true,
            calibration_level: CalibrationLevel::Recommended,
            calibration_file: None,
        }
    }
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.history.capacity == 0 {
            return Err(crate::Error::Config("history capacity must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.spatial.hysteresis_threshold) {
            return Err(crate::Error::Config(format!(
                "hysteresis_threshold must be in [0, 1], got {}",
                self.spatial.hysteresis_threshold
            )));
        }
        self.spatial
            .grid_presets
            .validate()
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        if !(0.0..=1.0).contains(&self.matching.gesture_confidence) {
            return Err(crate::Error::Config(format!(
                "gesture_confidence must be in [0, 1], got {}",
                self.matching.gesture_confidence
            )));
        }
        if self.matching.contact_threshold <= 0.0 || self.matching.contact_threshold > 1.0 {
            return Err(crate::Error::Config(format!(
                "contact_threshold must be in (0, 1], got {}",
                self.matching.contact_threshold
            )));
        }
        self.resolution.validate()?;
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".hand_intent").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
