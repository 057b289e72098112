use crate::clip::{clips_on_track, spans_overlap, Clip};
use crate::config::SnapSettings;
use crate::error::{CoreError, PlacementError, Result};
use crate::snapping;
use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a single overlap produced by a move was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapResolution {
    /// The two clips traded positions.
    Swapped {
        other: Uuid,
        moved_to: TimeUs,
        other_to: TimeUs,
    },
    /// The moved clip was put directly after the overlapped clip.
    Appended { after: Uuid, at: TimeUs },
    Rejected,
}

/// What a committed placement ended up doing. Returned to the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed,
    Swapped { other: Uuid },
    Appended { after: Uuid },
}

/// A fully resolved move, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub clip_id: Uuid,
    pub track: TrackId,
    pub start: TimeUs,
    pub outcome: PlacementOutcome,
    /// A clip relocated by a swap, with its new start.
    pub displaced: Option<(Uuid, TimeUs)>,
}

impl MovePlan {
    /// Apply to a clip collection. The plan must come from the same collection.
    pub fn apply(&self, clips: &mut [Clip]) {
        for clip in clips.iter_mut() {
            if clip.id == self.clip_id {
                clip.place(self.track, self.start);
            } else if let Some((other, other_start)) = self.displaced {
                if clip.id == other {
                    clip.timeline_start = other_start;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-place
// ---------------------------------------------------------------------------

/// Leftmost start on `track` where `duration` fits: the lead-in before the
/// first clip, then each gap between neighbours, else after the last clip.
pub fn auto_place<'a>(
    clips: impl IntoIterator<Item = &'a Clip>,
    track: TrackId,
    duration: TimeUs,
) -> TimeUs {
    let mut cursor = TimeUs::ZERO;
    for clip in clips_on_track(clips, track) {
        if clip.timeline_start - cursor >= duration {
            return cursor;
        }
        cursor = cursor.max(clip.timeline_end());
    }
    cursor
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Snap `raw_start`, then decide where `clip_id` ends up on `track`.
pub fn plan_move(
    clips: &[Clip],
    snap: &SnapSettings,
    clip_id: Uuid,
    track: TrackId,
    raw_start: TimeUs,
) -> Result<MovePlan> {
    let moving = clips
        .iter()
        .find(|c| c.id == clip_id)
        .ok_or(CoreError::ClipNotFound(clip_id))?;

    let start = snapping::snap(clips, snap, raw_start.clamp_position(), Some(clip_id), track)
        .clamp_position();
    let end = start + moving.duration();

    let overlapped: Vec<&Clip> = clips_on_track(clips, track)
        .into_iter()
        .filter(|c| c.id != clip_id)
        .filter(|c| spans_overlap(start, end, c.timeline_start, c.timeline_end()))
        .collect();

    let plan = match overlapped.as_slice() {
        [] => MovePlan {
            clip_id,
            track,
            start,
            outcome: PlacementOutcome::Placed,
            displaced: None,
        },
        [other] => match resolve_single_overlap(clips, moving, track, other) {
            OverlapResolution::Swapped {
                other,
                moved_to,
                other_to,
            } => MovePlan {
                clip_id,
                track,
                start: moved_to,
                outcome: PlacementOutcome::Swapped { other },
                displaced: Some((other, other_to)),
            },
            OverlapResolution::Appended { after, at } => MovePlan {
                clip_id,
                track,
                start: at,
                outcome: PlacementOutcome::Appended { after },
                displaced: None,
            },
            OverlapResolution::Rejected => {
                return Err(PlacementError::Blocked(other.id).into());
            }
        },
        _ => {
            debug!(clip = %clip_id, count = overlapped.len(), "move overlaps several clips");
            return Err(PlacementError::MultiOverlap.into());
        }
    };

    debug!(clip = %clip_id, %track, raw = %raw_start, start = %plan.start, outcome = ?plan.outcome, "planned move");
    Ok(plan)
}

/// Resolve a move of `moving` onto `track` that overlaps exactly `other`.
///
/// A clip already on the track swaps places with `other` when the swapped
/// layout is free. Otherwise the clip goes right after `other` if that slot
/// is free, and the move is rejected if not.
pub fn resolve_single_overlap(
    clips: &[Clip],
    moving: &Clip,
    track: TrackId,
    other: &Clip,
) -> OverlapResolution {
    let bystanders: Vec<&Clip> = clips_on_track(clips, track)
        .into_iter()
        .filter(|c| c.id != moving.id && c.id != other.id)
        .collect();
    let is_free = |start: TimeUs, end: TimeUs| {
        bystanders
            .iter()
            .all(|c| !spans_overlap(start, end, c.timeline_start, c.timeline_end()))
    };

    if moving.is_on(track) {
        let moved_to = other.timeline_start;
        let moved_end = moved_to + moving.duration();
        let other_to = moving.timeline_start;
        let other_end = other_to + other.duration();
        if !spans_overlap(moved_to, moved_end, other_to, other_end)
            && is_free(moved_to, moved_end)
            && is_free(other_to, other_end)
        {
            return OverlapResolution::Swapped {
                other: other.id,
                moved_to,
                other_to,
            };
        }
    }

    let at = other.timeline_end();
    if is_free(at, at + moving.duration()) {
        return OverlapResolution::Appended { after: other.id, at };
    }

    OverlapResolution::Rejected
}

/// Resolve where a clip lands for a library drop or "add" action.
pub fn plan_placement(
    clips: &[Clip],
    snap: &SnapSettings,
    clip_id: Uuid,
    track: TrackId,
    drop: DropTime,
) -> Result<MovePlan> {
    match drop {
        DropTime::At(time) => plan_move(clips, snap, clip_id, track, time),
        DropTime::Auto => {
            let clip = clips
                .iter()
                .find(|c| c.id == clip_id)
                .ok_or(CoreError::ClipNotFound(clip_id))?;
            let start = auto_place(clips.iter().filter(|c| c.id != clip_id), track, clip.duration());
            debug!(clip = %clip_id, %track, %start, "auto-placed");
            Ok(MovePlan {
                clip_id,
                track,
                start,
                outcome: PlacementOutcome::Placed,
                displaced: None,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
