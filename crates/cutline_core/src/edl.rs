//! Edit decision list handed to the external exporter.

use crate::clip::Clip;
use crate::error::{CoreError, Result};
use crate::registry::AssetRegistry;
use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One `(source, in, out)` range and where it lands on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdlEntry {
    pub clip_id: Uuid,
    pub track: TrackId,
    pub source: SourceHandle,
    pub source_in: TimeUs,
    pub source_out: TimeUs,
    pub record_in: TimeUs,
    pub record_out: TimeUs,
}

impl EdlEntry {
    pub fn duration(&self) -> TimeUs {
        self.source_out - self.source_in
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EditDecisionList {
    pub entries: Vec<EdlEntry>,
}

impl EditDecisionList {
    /// Placed clips on `tracks`, in timeline order. Clips starting together
    /// are ordered by track.
    pub fn build(clips: &[Clip], assets: &AssetRegistry, tracks: &[TrackId]) -> Result<Self> {
        let mut selected: Vec<&Clip> = clips
            .iter()
            .filter(|c| c.track.is_some_and(|t| tracks.contains(&t)))
            .collect();
        selected.sort_by_key(|c| (c.timeline_start, c.track));

        let entries = selected
            .into_iter()
            .map(|clip| {
                let asset = assets
                    .get(clip.asset_id)
                    .ok_or(CoreError::AssetNotFound(clip.asset_id))?;
                Ok(EdlEntry {
                    clip_id: clip.id,
                    track: clip.track.unwrap_or(TrackId::MAIN),
                    source: asset.source.clone(),
                    source_in: clip.source_in,
                    source_out: clip.source_out,
                    record_in: clip.timeline_start,
                    record_out: clip.timeline_end(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the last entry on the record side.
    pub fn total_duration(&self) -> TimeUs {
        self.entries
            .iter()
            .map(|e| e.record_out)
            .max()
            .unwrap_or(TimeUs::ZERO)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_csv(&self) -> String {
        let mut out = "track,source,source_in,source_out,record_in,record_out\n".to_string();
        for entry in &self.entries {
            out.push_str(&format!(
                "{},{},{:.3},{:.3},{:.3},{:.3}\n",
                entry.track.0,
                entry.source,
                entry.source_in.as_seconds(),
                entry.source_out.as_seconds(),
                entry.record_in.as_seconds(),
                entry.record_out.as_seconds(),
            ));
        }
        out
    }
}
