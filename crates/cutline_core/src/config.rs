use crate::error::Result;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// SnapSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapSettings {
    pub enabled: bool,
    /// Spacing of the grid points.
    pub grid_interval: TimeUs,
    /// A candidate strictly closer than this to a grid point snaps to it.
    pub grid_threshold: TimeUs,
    /// A candidate strictly closer than this to a clip edge snaps to it.
    pub edge_threshold: TimeUs,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_interval: TimeUs::SECOND,
            grid_threshold: TimeUs(200_000),
            edge_threshold: TimeUs(300_000),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapSettings,
    /// Shortest span any clip may have (ε).
    pub min_clip_duration: TimeUs,
    /// Substituted for an asset whose probe failed or has not finished.
    pub fallback_duration: TimeUs,
    pub tracks: Vec<TrackSpec>,
    /// Track whose clips drive the playback transport.
    pub driving_track: TrackId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap: SnapSettings::default(),
            min_clip_duration: TimeUs(100_000),
            fallback_duration: TimeUs::from_seconds(10.0),
            tracks: default_tracks(),
            driving_track: TrackId::MAIN,
        }
    }
}

impl EngineConfig {
    pub fn has_track(&self, track: TrackId) -> bool {
        self.tracks.iter().any(|t| t.id == track)
    }

    pub fn track(&self, track: TrackId) -> Option<&TrackSpec> {
        self.tracks.iter().find(|t| t.id == track)
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Save as pretty-printed JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Main video, overlay/PiP and audio lanes.
pub fn default_tracks() -> Vec<TrackSpec> {
    vec![
        TrackSpec::new(0, "Main Video", TrackKind::Video),
        TrackSpec::new(1, "Overlay/PiP", TrackKind::Overlay),
        TrackSpec::new(2, "Audio", TrackKind::Audio),
    ]
}
