use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// MediaAsset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DurationSource {
    Probed,
    Fallback,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbedDuration {
    pub value: TimeUs,
    pub source: DurationSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAsset {
    pub id: Uuid,
    pub name: String,
    pub source: SourceHandle,
    pub origin: AssetOrigin,
    pub duration: Option<ProbedDuration>,
}

impl MediaAsset {
    /// Known duration, or `fallback` while the probe is outstanding.
    pub fn effective_duration(&self, fallback: TimeUs) -> TimeUs {
        self.duration.map(|d| d.value).unwrap_or(fallback)
    }

    pub fn is_probed(&self) -> bool {
        matches!(
            self.duration,
            Some(ProbedDuration {
                source: DurationSource::Probed,
                ..
            })
        )
    }
}

// ---------------------------------------------------------------------------
// AssetRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets: Vec<MediaAsset>,
    fallback: TimeUs,
}

impl AssetRegistry {
    pub fn new(fallback: TimeUs) -> Self {
        Self {
            assets: Vec::new(),
            fallback,
        }
    }

    /// Create an entry with no duration yet. Never waits on metadata.
    pub fn register(
        &mut self,
        source: SourceHandle,
        name: impl Into<String>,
        origin: AssetOrigin,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.assets.push(MediaAsset {
            id,
            name: name.into(),
            source,
            origin,
            duration: None,
        });
        debug!(asset = %id, "registered asset");
        id
    }

    /// Record a probed duration. Last write wins; unknown ids are ignored.
    pub fn set_duration(&mut self, asset_id: Uuid, duration: TimeUs) {
        let Some(asset) = self.assets.iter_mut().find(|a| a.id == asset_id) else {
            warn!(asset = %asset_id, "set_duration for unknown asset ignored");
            return;
        };
        if duration <= TimeUs::ZERO {
            warn!(asset = %asset_id, %duration, "non-positive probed duration, using fallback");
            asset.duration = Some(ProbedDuration {
                value: self.fallback,
                source: DurationSource::Fallback,
            });
            return;
        }
        if let Some(prev) = asset.duration {
            debug!(asset = %asset_id, previous = %prev.value, %duration, "overwriting duration");
        }
        asset.duration = Some(ProbedDuration {
            value: duration,
            source: DurationSource::Probed,
        });
    }

    /// Substitute the fallback duration unless a real probe already landed.
    pub fn mark_probe_failed(&mut self, asset_id: Uuid) {
        let Some(asset) = self.assets.iter_mut().find(|a| a.id == asset_id) else {
            warn!(asset = %asset_id, "probe failure for unknown asset ignored");
            return;
        };
        if asset.is_probed() {
            debug!(asset = %asset_id, "probe failure after a successful probe ignored");
            return;
        }
        warn!(asset = %asset_id, fallback = %self.fallback, "probe failed, using fallback duration");
        asset.duration = Some(ProbedDuration {
            value: self.fallback,
            source: DurationSource::Fallback,
        });
    }

    pub fn get(&self, asset_id: Uuid) -> Option<&MediaAsset> {
        self.assets.iter().find(|a| a.id == asset_id)
    }

    pub fn effective_duration(&self, asset_id: Uuid) -> Option<TimeUs> {
        self.get(asset_id).map(|a| a.effective_duration(self.fallback))
    }

    pub fn remove(&mut self, asset_id: Uuid) -> Option<MediaAsset> {
        let pos = self.assets.iter().position(|a| a.id == asset_id)?;
        Some(self.assets.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn registry() -> AssetRegistry {
        AssetRegistry::new(TimeUs::from_seconds(10.0))
    }

    fn source(name: &str) -> SourceHandle {
        SourceHandle::Path(PathBuf::from(format!("/media/{name}")))
    }

    #[test]
    fn register_starts_without_duration() {
        let mut reg = registry();
        let id = reg.register(source("a.mp4"), "a.mp4", AssetOrigin::Imported);
        let asset = reg.get(id).unwrap();
        assert_eq!(asset.duration, None);
        assert_eq!(asset.name, "a.mp4");
        assert_eq!(reg.effective_duration(id), Some(TimeUs(10_000_000)));
    }

    #[test]
    fn set_duration_is_last_write_wins() {
        let mut reg = registry();
        let id = reg.register(source("a.mp4"), "a.mp4", AssetOrigin::Imported);
        reg.set_duration(id, TimeUs(4_000_000));
        reg.set_duration(id, TimeUs(4_200_000));
        assert_eq!(reg.effective_duration(id), Some(TimeUs(4_200_000)));
        assert!(reg.get(id).unwrap().is_probed());
    }

    #[test]
    fn set_duration_unknown_asset_is_ignored() {
        let mut reg = registry();
        reg.set_duration(Uuid::new_v4(), TimeUs(1_000_000));
        assert!(reg.is_empty());
    }

    #[test]
    fn zero_duration_falls_back() {
        let mut reg = registry();
        let id = reg.register(source("cap.webm"), "cap", AssetOrigin::ScreenCapture);
        reg.set_duration(id, TimeUs::ZERO);
        let d = reg.get(id).unwrap().duration.unwrap();
        assert_eq!(d.source, DurationSource::Fallback);
        assert_eq!(d.value, TimeUs(10_000_000));
    }

    #[test]
    fn probe_failure_uses_fallback() {
        let mut reg = registry();
        let id = reg.register(source("b.mp4"), "b.mp4", AssetOrigin::Webcam);
        reg.mark_probe_failed(id);
        let d = reg.get(id).unwrap().duration.unwrap();
        assert_eq!(d.source, DurationSource::Fallback);
        assert_eq!(d.value, TimeUs(10_000_000));
    }

    #[test]
    fn late_probe_failure_keeps_real_duration() {
        let mut reg = registry();
        let id = reg.register(source("b.mp4"), "b.mp4", AssetOrigin::Imported);
        reg.set_duration(id, TimeUs(3_000_000));
        reg.mark_probe_failed(id);
        assert_eq!(reg.effective_duration(id), Some(TimeUs(3_000_000)));
    }

    #[test]
    fn successful_retry_replaces_fallback() {
        let mut reg = registry();
        let id = reg.register(source("b.mp4"), "b.mp4", AssetOrigin::Imported);
        reg.mark_probe_failed(id);
        reg.set_duration(id, TimeUs(6_000_000));
        assert!(reg.get(id).unwrap().is_probed());
        assert_eq!(reg.effective_duration(id), Some(TimeUs(6_000_000)));
    }

    #[test]
    fn remove_returns_asset() {
        let mut reg = registry();
        let id = reg.register(source("a.mp4"), "a.mp4", AssetOrigin::Imported);
        let removed = reg.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(reg.get(id).is_none());
        assert!(reg.remove(id).is_none());
    }
}
