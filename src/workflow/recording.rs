//! Frame Recording Format
//!
//! A recording is a JSON fixture of detection frames, captured from the
//! upstream adapter or written by hand, that can be replayed through the
//! engine offline.

use crate::frame::FrameSnapshot;
use crate::time::Timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Current recording format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

/// Recording metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingMetadata {
    /// Unique recording ID
    pub id: Uuid,
    /// Recording name
    pub name: String,
    /// What the recording demonstrates
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Total frame count
    pub frame_count: usize,
    /// First-to-last frame span in milliseconds
    pub duration_ms: u64,
    /// Version of the recording format
    pub format_version: String,
}

impl RecordingMetadata {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: Utc::now(),
            frame_count: 0,
            duration_ms: 0,
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

impl Default for RecordingMetadata {
    fn default() -> Self {
        Self::new(String::new(), None)
    }
}

/// An ordered sequence of frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecording {
    pub metadata: RecordingMetadata,
    pub frames: Vec<FrameSnapshot>,
}

impl FrameRecording {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            metadata: RecordingMetadata::new(name, description),
            frames: Vec::new(),
        }
    }

    /// Build a finalized recording from frames
    pub fn from_frames(name: String, frames: Vec<FrameSnapshot>) -> Self {
        let mut recording = Self::new(name, None);
        recording.frames = frames;
        recording.finalize();
        recording
    }

    pub fn add_frame(&mut self, frame: FrameSnapshot) {
        self.frames.push(frame);
    }

    /// Refresh frame count and duration from the frames
    pub fn finalize(&mut self) {
        self.metadata.frame_count = self.frames.len();
        self.metadata.duration_ms = match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last.duration_since(first).as_millis(),
            _ => 0,
        };
    }

    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.frames.first().map(|f| f.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.frames.last().map(|f| f.timestamp)
    }

    /// Frames must be in non-decreasing timestamp order
    pub fn validate(&self) -> crate::Result<()> {
        for (i, pair) in self.frames.windows(2).enumerate() {
            if pair[0].timestamp.is_after(pair[1].timestamp) {
                return Err(crate::Error::Recording(format!(
                    "frame {} at {} precedes frame {} at {}",
                    i + 1,
                    pair[1].timestamp,
                    i,
                    pair[0].timestamp
                )));
            }
        }
        Ok(())
    }

    /// Save recording to a file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load recording from a file.
    ///
    /// Logs a warning if the recording was saved with a different format
    /// version, but still attempts to use it.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let recording: FrameRecording = serde_json::from_str(&content)?;
        if recording.metadata.format_version != CURRENT_FORMAT_VERSION {
            tracing::warn!(
                name = %recording.metadata.name,
                found = %recording.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Recording has different format version; some fields may use default values"
            );
        }
        recording.validate()?;
        Ok(recording)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames with at least one hand
    pub fn frames_with_hands(&self) -> usize {
        self.frames.iter().filter(|f| !f.hands().is_empty()).count()
    }
}

impl Default for FrameRecording {
    fn default() -> Self {
        Self::new("untitled".to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::types::test_support::hand_at;
    use crate::frame::Handedness;
    use tempfile::TempDir;

    fn frames() -> Vec<FrameSnapshot> {
        vec![
            FrameSnapshot::with_hands(Timestamp::from_millis(1000), vec![hand_at(Handedness::Left, 0, 0.5, 0.5, 0.02)]),
            FrameSnapshot::empty(Timestamp::from_millis(1033)),
            FrameSnapshot::with_hands(Timestamp::from_millis(1066), vec![hand_at(Handedness::Right, 1, 0.4, 0.4, 0.2)]),
        ]
    }

    #[test]
    fn test_from_frames_finalizes() {
        let recording = FrameRecording::from_frames("pinch".to_string(), frames());
        assert_eq!(recording.metadata.frame_count, 3);
        assert_eq!(recording.metadata.duration_ms, 66);
        assert_eq!(recording.frames_with_hands(), 2);
        assert_eq!(recording.metadata.format_version, CURRENT_FORMAT_VERSION);
    }

    #[test]
    fn test_empty_recording() {
        let mut recording = FrameRecording::default();
        recording.finalize();
        assert!(recording.is_empty());
        assert_eq!(recording.metadata.duration_ms, 0);
        assert!(recording.first_timestamp().is_none());
        assert!(recording.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_recording() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("fixtures").join("pinch.json");

        let recording = FrameRecording::from_frames("pinch".to_string(), frames());
        recording.save(&path).expect("Failed to save recording");
        let loaded = FrameRecording::load(&path).expect("Failed to load recording");
        assert_eq!(loaded.metadata, recording.metadata);
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.frames[2].hands()[0].handedness, Handedness::Right);
        assert_eq!(loaded.last_timestamp(), Some(Timestamp::from_millis(1066)));
    }

    #[test]
    fn test_out_of_order_frames_rejected() {
        let mut recording = FrameRecording::from_frames("bad".to_string(), frames());
        recording.frames.swap(0, 2);
        assert!(matches!(recording.validate(), Err(crate::Error::Recording(_))));
    }

    #[test]
    fn test_load_malformed_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FrameRecording::load(&path), Err(crate::Error::Serialization(_))));
    }

    #[test]
    fn test_version_mismatch_still_loads() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("old.json");
        let mut recording = FrameRecording::from_frames("old".to_string(), frames());
        recording.metadata.format_version = "0.9".to_string();
        recording.save(&path).unwrap();
        assert_eq!(FrameRecording::load(&path).unwrap().metadata.format_version, "0.9");
    }

    #[test]
    fn test_metadata_missing_fields_use_defaults() {
        let json = r#"{"metadata": {"name": "minimal"}, "frames": [{"timestamp": 5}]}"#;
        let recording: FrameRecording = serde_json::from_str(json).unwrap();
        assert_eq!(recording.metadata.name, "minimal");
        assert_eq!(recording.metadata.format_version, CURRENT_FORMAT_VERSION);
        assert_eq!(recording.frames[0].timestamp, Timestamp::from_millis(5));
        assert!(recording.frames[0].hands().is_empty());
    }
}
