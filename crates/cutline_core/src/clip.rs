use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A trimmed view of a media asset, optionally placed on a track.
///
/// The timeline end is derived from the source range, so a clip always
/// occupies exactly `source_out - source_in` on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub display_name: String,
    /// `None` while the clip only lives in the library.
    pub track: Option<TrackId>,
    pub timeline_start: TimeUs,
    pub source_in: TimeUs,
    pub source_out: TimeUs,
}

impl Clip {
    /// A library clip covering the whole asset.
    pub fn from_asset(asset_id: Uuid, name: impl Into<String>, full_duration: TimeUs) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id,
            display_name: name.into(),
            track: None,
            timeline_start: TimeUs::ZERO,
            source_in: TimeUs::ZERO,
            source_out: full_duration,
        }
    }

    pub fn duration(&self) -> TimeUs {
        self.source_out - self.source_in
    }

    pub fn timeline_end(&self) -> TimeUs {
        self.timeline_start + self.duration()
    }

    pub fn placed(&self) -> bool {
        self.track.is_some()
    }

    pub fn is_on(&self, track: TrackId) -> bool {
        self.track == Some(track)
    }

    /// Half-open containment: a clip does not contain its own end time.
    pub fn contains(&self, time: TimeUs) -> bool {
        self.placed() && self.timeline_start <= time && time < self.timeline_end()
    }

    pub fn overlaps(&self, other: &Clip) -> bool {
        spans_overlap(
            self.timeline_start,
            self.timeline_end(),
            other.timeline_start,
            other.timeline_end(),
        )
    }

    pub fn place(&mut self, track: TrackId, start: TimeUs) {
        self.track = Some(track);
        self.timeline_start = start;
    }

    pub fn unplace(&mut self) {
        self.track = None;
        self.timeline_start = TimeUs::ZERO;
    }

    pub fn snapshot(&self) -> ClipSnapshot {
        ClipSnapshot {
            id: self.id,
            asset_id: self.asset_id,
            display_name: self.display_name.clone(),
            track: self.track,
            placed: self.placed(),
            timeline_start: self.timeline_start,
            // Library clips report an empty span
            timeline_end: if self.placed() {
                self.timeline_end()
            } else {
                self.timeline_start
            },
            source_in: self.source_in,
            source_out: self.source_out,
        }
    }
}

/// `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn spans_overlap(a_start: TimeUs, a_end: TimeUs, b_start: TimeUs, b_end: TimeUs) -> bool {
    a_start < b_end && b_start < a_end
}

// ---------------------------------------------------------------------------
// ClipSnapshot
// ---------------------------------------------------------------------------

/// Read-only view handed to the UI, with derived fields filled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipSnapshot {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub display_name: String,
    pub track: Option<TrackId>,
    pub placed: bool,
    pub timeline_start: TimeUs,
    pub timeline_end: TimeUs,
    pub source_in: TimeUs,
    pub source_out: TimeUs,
}

impl ClipSnapshot {
    pub fn duration(&self) -> TimeUs {
        self.source_out - self.source_in
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the per-clip invariants against the owning asset's duration.
pub fn validate(clip: &Clip, asset_duration: TimeUs, min_duration: TimeUs) -> Result<()> {
    if clip.source_in < TimeUs::ZERO {
        return Err(CoreError::InvariantViolation(format!(
            "clip {}: source_in {} is negative",
            clip.id, clip.source_in
        )));
    }
    if clip.source_out > asset_duration {
        return Err(CoreError::InvariantViolation(format!(
            "clip {}: source_out {} exceeds asset duration {}",
            clip.id, clip.source_out, asset_duration
        )));
    }
    if clip.duration() < min_duration {
        return Err(CoreError::InvariantViolation(format!(
            "clip {}: duration {} is below the minimum {}",
            clip.id,
            clip.duration(),
            min_duration
        )));
    }
    if clip.timeline_start < TimeUs::ZERO {
        return Err(CoreError::InvariantViolation(format!(
            "clip {}: timeline start {} is negative",
            clip.id, clip.timeline_start
        )));
    }
    if !clip.placed() && clip.timeline_start != TimeUs::ZERO {
        return Err(CoreError::InvariantViolation(format!(
            "clip {}: unplaced clip has a timeline position",
            clip.id
        )));
    }
    Ok(())
}

/// Check that no two placed clips on `track` overlap.
pub fn validate_track_layout<'a>(
    clips: impl IntoIterator<Item = &'a Clip>,
    track: TrackId,
) -> Result<()> {
    let mut on_track: Vec<&Clip> = clips.into_iter().filter(|c| c.is_on(track)).collect();
    on_track.sort_by_key(|c| c.timeline_start);
    for pair in on_track.windows(2) {
        if pair[0].overlaps(pair[1]) {
            return Err(CoreError::InvariantViolation(format!(
                "clips {} and {} overlap on {}",
                pair[0].id, pair[1].id, track
            )));
        }
    }
    Ok(())
}

/// Placed clips on `track`, ordered by timeline start.
pub fn clips_on_track<'a>(
    clips: impl IntoIterator<Item = &'a Clip>,
    track: TrackId,
) -> Vec<&'a Clip> {
    let mut on_track: Vec<&Clip> = clips.into_iter().filter(|c| c.is_on(track)).collect();
    on_track.sort_by_key(|c| c.timeline_start);
    on_track
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
