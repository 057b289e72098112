use crate::clip::{clips_on_track, Clip};
use crate::config::SnapSettings;
use crate::types::*;
use uuid::Uuid;

/// Find the nearest snap point strictly closer than `threshold`.
/// Ties go to the earlier point in `snap_points`.
pub fn find_snap_point(
    position: TimeUs,
    snap_points: &[TimeUs],
    threshold: TimeUs,
) -> Option<TimeUs> {
    let mut best: Option<(TimeUs, TimeUs)> = None;

    for &point in snap_points {
        let dist = position.distance(point);
        if dist >= threshold {
            continue;
        }
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((point, dist)),
        }
    }

    best.map(|(point, _)| point)
}

/// Round to the nearest grid point when strictly within the grid threshold.
pub fn grid_snap(position: TimeUs, settings: &SnapSettings) -> TimeUs {
    let grid = position.round_to(settings.grid_interval);
    if position.distance(grid) < settings.grid_threshold {
        grid
    } else {
        position
    }
}

/// Start and end edges of the other placed clips on `track`, ascending.
pub fn collect_snap_points(clips: &[Clip], track: TrackId, exclude_clip: Option<Uuid>) -> Vec<TimeUs> {
    let mut points = Vec::new();

    for clip in clips_on_track(clips, track) {
        if Some(clip.id) == exclude_clip {
            continue;
        }
        points.push(clip.timeline_start);
        points.push(clip.timeline_end());
    }

    points.sort();
    points.dedup();
    points
}

/// Snap a candidate position: grid first, then a nearby clip edge overrides it.
/// Both passes measure from the raw candidate.
pub fn snap(
    clips: &[Clip],
    settings: &SnapSettings,
    candidate: TimeUs,
    exclude_clip: Option<Uuid>,
    track: TrackId,
) -> TimeUs {
    if !settings.enabled {
        return candidate;
    }

    let snapped = grid_snap(candidate, settings);
    let points = collect_snap_points(clips, track, exclude_clip);
    find_snap_point(candidate, &points, settings.edge_threshold).unwrap_or(snapped)
}
