use crate::clip::{clips_on_track, Clip};
use crate::error::{CoreError, Result};
use crate::types::*;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// Split a placed clip at a timeline position into two clips.
///
/// Returns `None` unless `at` is strictly inside the clip and both parts are
/// at least `min_duration` long. The left part keeps the original id.
pub fn split(clip: &Clip, at: TimeUs, min_duration: TimeUs) -> Option<(Clip, Clip)> {
    let start = clip.timeline_start;
    let end = clip.timeline_end();
    if at <= start || at >= end {
        return None;
    }
    if at - start < min_duration || end - at < min_duration {
        return None;
    }

    // Source position matching the split point
    let split_source = clip.source_in + (at - start);

    let left = Clip {
        source_out: split_source,
        display_name: format!("{} (Part 1)", clip.display_name),
        ..clip.clone()
    };
    let right = Clip {
        id: Uuid::new_v4(),
        timeline_start: at,
        source_in: split_source,
        display_name: format!("{} (Part 2)", clip.display_name),
        ..clip.clone()
    };
    Some((left, right))
}

// ---------------------------------------------------------------------------
// Trim
// ---------------------------------------------------------------------------

/// Limits a trim must respect besides the clip itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimBounds {
    pub min_duration: TimeUs,
    pub asset_duration: TimeUs,
    /// End of the previous clip on the same track.
    pub prev_end: Option<TimeUs>,
    /// Start of the next clip on the same track.
    pub next_start: Option<TimeUs>,
}

impl TrimBounds {
    /// Bounds for `clip` against its neighbours in `clips`.
    pub fn for_clip(clips: &[Clip], clip: &Clip, asset_duration: TimeUs, min_duration: TimeUs) -> Self {
        let mut bounds = Self {
            min_duration,
            asset_duration,
            prev_end: None,
            next_start: None,
        };
        let Some(track) = clip.track else {
            return bounds;
        };
        for other in clips_on_track(clips, track) {
            if other.id == clip.id {
                continue;
            }
            if other.timeline_end() <= clip.timeline_start {
                bounds.prev_end = Some(other.timeline_end());
            } else if other.timeline_start >= clip.timeline_end() && bounds.next_start.is_none() {
                bounds.next_start = Some(other.timeline_start);
            }
        }
        bounds
    }
}

/// Drag one edge of a clip to `raw_time`, clamped to the bounds.
///
/// The source range moves by the same delta as the timeline edge. The
/// minimum duration wins over every other limit.
pub fn trim_edge(clip: &Clip, edge: Edge, raw_time: TimeUs, bounds: &TrimBounds) -> Clip {
    let mut trimmed = clip.clone();
    let start = clip.timeline_start;
    let end = clip.timeline_end();

    match edge {
        Edge::Start => {
            // Cannot reveal source before 0 or cross the previous clip
            let mut lower = (start - clip.source_in).clamp_non_negative();
            if let Some(prev_end) = bounds.prev_end {
                lower = lower.max(prev_end);
            }
            let upper = end - bounds.min_duration;
            let new_start = raw_time.max(lower).min(upper);
            let delta = new_start - start;
            trimmed.timeline_start = new_start;
            trimmed.source_in = clip.source_in + delta;
        }
        Edge::End => {
            let mut upper = start + (bounds.asset_duration - clip.source_in);
            if let Some(next_start) = bounds.next_start {
                upper = upper.min(next_start);
            }
            let lower = start + bounds.min_duration;
            let new_end = raw_time.min(upper).max(lower);
            trimmed.source_out = clip.source_out + (new_end - end);
        }
    }

    trimmed
}

// ---------------------------------------------------------------------------
// Extract
// ---------------------------------------------------------------------------

/// Copy a sub-range of `clip` (timeline coordinates) into a new library clip.
///
/// The range is clipped to the clip's own span first.
pub fn extract_range(
    clip: &Clip,
    range_start: TimeUs,
    range_end: TimeUs,
    min_duration: TimeUs,
) -> Result<Clip> {
    let start = range_start.max(clip.timeline_start);
    let end = range_end.min(clip.timeline_end());
    if end - start < min_duration {
        return Err(CoreError::RangeTooShort);
    }

    let source_in = clip.source_in + (start - clip.timeline_start);
    Ok(Clip {
        id: Uuid::new_v4(),
        asset_id: clip.asset_id,
        display_name: format!("{} (Clip)", clip.display_name),
        track: None,
        timeline_start: TimeUs::ZERO,
        source_in,
        source_out: source_in + (end - start),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
