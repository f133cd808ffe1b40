//! Per-finger pinch calibration tables
//!
//! Thumb-to-finger distances at which a pinch reliably registers differ by
//! finger: the ring finger in particular shows high biomechanical variance
//! and needs a looser threshold. Tables are versioned data so they can be
//! re-derived from new recordings and loaded without touching the matcher.

use super::types::{CalibrationLevel, Finger};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Version tag of the built-in table
pub const BUILTIN_CALIBRATION_VERSION: &str = "1.0";

static BUILTIN: OnceLock<CalibrationTable> = OnceLock::new();

/// Thresholds for one finger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerThresholds {
    pub tight: f64,
    pub recommended: f64,
    pub relaxed: f64,
}

impl FingerThresholds {
    pub const fn new(tight: f64, recommended: f64, relaxed: f64) -> Self {
        Self {
            tight,
            recommended,
            relaxed,
        }
    }

    pub fn get(&self, level: CalibrationLevel) -> f64 {
        match level {
            CalibrationLevel::Tight => self.tight,
            CalibrationLevel::Recommended => self.recommended,
            CalibrationLevel::Relaxed => self.relaxed,
        }
    }
}

/// Versioned threshold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    pub version: String,
    pub index: FingerThresholds,
    pub middle: FingerThresholds,
    pub ring: FingerThresholds,
    pub pinky: FingerThresholds,
}

impl CalibrationTable {
    /// Shared reference to the built-in table
    pub fn builtin() -> &'static CalibrationTable {
        BUILTIN.get_or_init(CalibrationTable::v1)
    }

    /// Table derived from the first round of pinch recordings
    pub fn v1() -> Self {
        Self {
            version: BUILTIN_CALIBRATION_VERSION.to_string(),
            index: FingerThresholds::new(0.043, 0.06, 0.08),
            middle: FingerThresholds::new(0.045, 0.065, 0.085),
            ring: FingerThresholds::new(0.06, 0.09, 0.11),
            pinky: FingerThresholds::new(0.05, 0.07, 0.09),
        }
    }

    pub fn finger(&self, finger: Finger) -> &FingerThresholds {
        match finger {
            Finger::Index => &self.index,
            Finger::Middle => &self.middle,
            Finger::Ring => &self.ring,
            Finger::Pinky => &self.pinky,
        }
    }

    /// Threshold for a finger at a calibration level
    pub fn threshold(&self, finger: Finger, level: CalibrationLevel) -> f64 {
        self.finger(finger).get(level)
    }

    /// Thresholds must be positive, at most 1, and ordered tight <= recommended <= relaxed
    pub fn validate(&self) -> crate::Result<()> {
        if self.version.trim().is_empty() {
            return Err(crate::Error::Calibration("version must not be empty".to_string()));
        }
        for finger in Finger::ALL {
            let t = self.finger(finger);
            let ordered = t.tight <= t.recommended && t.recommended <= t.relaxed;
            let in_range = t.tight > 0.0 && t.relaxed <= 1.0;
            if !ordered || !in_range {
                return Err(crate::Error::Calibration(format!(
                    "{:?} thresholds must satisfy 0 < tight <= recommended <= relaxed <= 1, got {:?}",
                    finger, t
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        if table.version != BUILTIN_CALIBRATION_VERSION {
            tracing::debug!(
                path = %path.display(),
                version = %table.version,
                "Loaded non-builtin calibration table"
            );
        }
        Ok(table)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::v1()
    }
}
