//! The facade UI event handlers call.
//!
//! Every mutation is computed on a copy of the clip list, validated as a
//! whole, and only then committed. A failed call leaves the timeline exactly
//! as it was.

use crate::clip::{validate, validate_track_layout, Clip, ClipSnapshot};
use crate::config::EngineConfig;
use crate::drag::{DragKind, DragOutcome, DragPreview, DragSession, DragTarget};
use crate::editing::{self, TrimBounds};
use crate::edl::EditDecisionList;
use crate::error::{CoreError, Result};
use crate::placement::{self, MovePlan, PlacementOutcome};
use crate::playhead::{self, FrameSource, PlaybackStep, Transport, TransportState};
use crate::registry::{AssetRegistry, MediaAsset};
use crate::types::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Timeline {
    config: EngineConfig,
    assets: AssetRegistry,
    clips: Vec<Clip>,
    transport: Transport,
    drag: Option<DragSession>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Timeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            assets: AssetRegistry::new(config.fallback_duration),
            transport: Transport::new(config.driving_track),
            clips: Vec::new(),
            drag: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.config.snap.enabled = enabled;
    }

    // ---- Assets ----

    pub fn add_asset(
        &mut self,
        source: SourceHandle,
        name: impl Into<String>,
        origin: AssetOrigin,
    ) -> Uuid {
        self.assets.register(source, name, origin)
    }

    /// Record a probed duration and refit the asset's clips to it. Returns
    /// the clips dropped because the asset is now too short to hold one.
    pub fn set_asset_duration(&mut self, asset_id: Uuid, duration: TimeUs) -> Vec<Uuid> {
        let previous = self.assets.effective_duration(asset_id);
        self.assets.set_duration(asset_id, duration);
        self.refit_clips(asset_id, previous)
    }

    pub fn mark_probe_failed(&mut self, asset_id: Uuid) -> Vec<Uuid> {
        let previous = self.assets.effective_duration(asset_id);
        self.assets.mark_probe_failed(asset_id);
        self.refit_clips(asset_id, previous)
    }

    /// Delete an asset nothing references any more.
    pub fn remove_asset(&mut self, asset_id: Uuid) -> Result<MediaAsset> {
        if self.assets.get(asset_id).is_none() {
            return Err(CoreError::AssetNotFound(asset_id));
        }
        if self.clips.iter().any(|c| c.asset_id == asset_id) {
            return Err(CoreError::AssetInUse(asset_id));
        }
        self.assets
            .remove(asset_id)
            .ok_or(CoreError::AssetNotFound(asset_id))
    }

    pub fn asset(&self, asset_id: Uuid) -> Option<&MediaAsset> {
        self.assets.get(asset_id)
    }

    pub fn assets(&self) -> impl Iterator<Item = &MediaAsset> {
        self.assets.iter()
    }

    /// Fit clips of `asset_id` to a duration that just changed.
    ///
    /// Ranges past the new end are pulled in. An unplaced clip that covered
    /// the whole previous duration keeps covering the whole asset. Clips of an
    /// asset shorter than the minimum clip duration are dropped.
    fn refit_clips(&mut self, asset_id: Uuid, previous: Option<TimeUs>) -> Vec<Uuid> {
        let Some(duration) = self.assets.effective_duration(asset_id) else {
            return Vec::new();
        };
        let min = self.config.min_clip_duration;
        let mut next = self.clips.clone();
        let mut dropped = Vec::new();
        if duration < min {
            dropped = next
                .iter()
                .filter(|c| c.asset_id == asset_id)
                .map(|c| c.id)
                .collect();
            next.retain(|c| c.asset_id != asset_id);
            warn!(
                asset = %asset_id,
                %duration,
                dropped = dropped.len(),
                "asset shorter than the minimum clip duration, dropping its clips"
            );
        }

        for clip in next.iter_mut().filter(|c| c.asset_id == asset_id) {
            let full_range = clip.source_in == TimeUs::ZERO && Some(clip.source_out) == previous;
            if !clip.placed() && full_range {
                clip.source_out = duration;
            } else if clip.source_out > duration {
                clip.source_out = duration;
                if clip.duration() < min {
                    clip.source_in = (duration - min).clamp_non_negative();
                }
            } else {
                continue;
            }
            debug!(clip = %clip.id, source_in = %clip.source_in, source_out = %clip.source_out, "refit clip to asset duration");
        }

        if let Err(e) = self.commit(next) {
            warn!(asset = %asset_id, error = %e, "refit rejected, dropping the asset's clips");
            dropped = self.clips.iter().filter(|c| c.asset_id == asset_id).map(|c| c.id).collect();
            self.clips.retain(|c| c.asset_id != asset_id);
            self.transport.clamp_to(&self.clips);
        }
        if self.drag.as_ref().is_some_and(|d| dropped.contains(&d.clip_id())) {
            self.drag = None;
        }
        dropped
    }

    // ---- Clips ----

    /// Create an unplaced clip covering the whole asset.
    pub fn import_as_clip(&mut self, asset_id: Uuid, name: impl Into<String>) -> Result<Uuid> {
        let duration = self
            .assets
            .effective_duration(asset_id)
            .ok_or(CoreError::AssetNotFound(asset_id))?;
        if duration < self.config.min_clip_duration {
            return Err(CoreError::AssetTooShort(asset_id));
        }
        let clip = Clip::from_asset(asset_id, name, duration);
        let id = clip.id;

        let mut next = self.clips.clone();
        next.push(clip);
        self.commit(next)?;
        debug!(clip = %id, asset = %asset_id, "imported clip");
        Ok(id)
    }

    /// Put a clip on `track`, at a drop position or wherever it first fits.
    pub fn place_on_timeline(
        &mut self,
        clip_id: Uuid,
        track: TrackId,
        drop: DropTime,
    ) -> Result<PlacementOutcome> {
        self.require_track(track)?;
        let plan = placement::plan_placement(&self.clips, &self.config.snap, clip_id, track, drop)?;
        self.commit_plan(&plan)?;
        Ok(plan.outcome)
    }

    /// Take a clip off the timeline, keeping it in the library.
    pub fn remove_from_timeline(&mut self, clip_id: Uuid) -> Result<()> {
        let index = self.index_of(clip_id)?;
        if !self.clips[index].placed() {
            return Ok(());
        }
        let mut next = self.clips.clone();
        next[index].unplace();
        self.commit(next)
    }

    /// Delete a clip. Returns its asset when no other clip references it.
    pub fn delete_clip(&mut self, clip_id: Uuid) -> Result<Option<MediaAsset>> {
        let index = self.index_of(clip_id)?;
        let mut next = self.clips.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        if self.clips.iter().any(|c| c.asset_id == removed.asset_id) {
            return Ok(None);
        }
        let released = self.assets.remove(removed.asset_id);
        if let Some(asset) = &released {
            info!(asset = %asset.id, "released orphaned asset");
        }
        Ok(released)
    }

    /// Reposition a placed clip, resolving a single overlap.
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        track: TrackId,
        new_start: TimeUs,
    ) -> Result<PlacementOutcome> {
        self.require_track(track)?;
        let clip = self.placed_clip(clip_id)?;
        let plan = placement::plan_move(&self.clips, &self.config.snap, clip.id, track, new_start)?;
        self.commit_plan(&plan)?;
        Ok(plan.outcome)
    }

    pub fn trim_clip(&mut self, clip_id: Uuid, edge: Edge, new_time: TimeUs) -> Result<()> {
        let trimmed = self.preview_trim(clip_id, edge, new_time)?;
        let index = self.index_of(clip_id)?;
        let mut next = self.clips.clone();
        next[index] = trimmed;
        self.commit(next)
    }

    /// Split at a timeline position. `None` when `at` is not strictly inside
    /// the clip or a part would be too short.
    pub fn split_clip(&mut self, clip_id: Uuid, at: TimeUs) -> Result<Option<(Uuid, Uuid)>> {
        let clip = self.placed_clip(clip_id)?;
        let Some((left, right)) = editing::split(clip, at, self.config.min_clip_duration) else {
            debug!(clip = %clip_id, %at, "split ignored");
            return Ok(None);
        };
        let ids = (left.id, right.id);

        let index = self.index_of(clip_id)?;
        let mut next = self.clips.clone();
        next[index] = left;
        next.insert(index + 1, right);
        self.commit(next)?;
        Ok(Some(ids))
    }

    /// Copy a sub-range of a clip into a new library clip.
    pub fn extract_range(&mut self, clip_id: Uuid, start: TimeUs, end: TimeUs) -> Result<Uuid> {
        let index = self.index_of(clip_id)?;
        let extracted =
            editing::extract_range(&self.clips[index], start, end, self.config.min_clip_duration)?;
        let id = extracted.id;

        let mut next = self.clips.clone();
        next.push(extracted);
        self.commit(next)?;
        Ok(id)
    }

    // ---- Queries ----

    pub fn clip(&self, clip_id: Uuid) -> Option<ClipSnapshot> {
        self.clips.iter().find(|c| c.id == clip_id).map(Clip::snapshot)
    }

    pub fn query_active_clip(&self, track: TrackId, time: TimeUs) -> Option<ClipSnapshot> {
        playhead::active_clip(&self.clips, track, time).map(Clip::snapshot)
    }

    pub fn query_total_duration(&self) -> TimeUs {
        playhead::total_duration(&self.clips)
    }

    /// Placed clips in timeline order, optionally restricted to one track.
    pub fn list_placed_clips(&self, track: Option<TrackId>) -> Vec<ClipSnapshot> {
        let mut placed: Vec<&Clip> = self
            .clips
            .iter()
            .filter(|c| match track {
                Some(track) => c.is_on(track),
                None => c.placed(),
            })
            .collect();
        placed.sort_by_key(|c| (c.timeline_start, c.track));
        placed.into_iter().map(Clip::snapshot).collect()
    }

    /// Every clip, placed or not, in creation order.
    pub fn library(&self) -> Vec<ClipSnapshot> {
        self.clips.iter().map(Clip::snapshot).collect()
    }

    pub fn resolve_frame(&self, time: TimeUs) -> Vec<FrameSource> {
        playhead::resolve_frame(&self.clips, time)
    }

    pub fn edit_decision_list(&self, tracks: &[TrackId]) -> Result<EditDecisionList> {
        EditDecisionList::build(&self.clips, &self.assets, tracks)
    }

    // ---- Transport ----

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn play(&mut self) -> bool {
        self.transport.play(&self.clips)
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    pub fn seek(&mut self, time: TimeUs) {
        self.transport.seek(&self.clips, time);
    }

    pub fn seek_resolved(&mut self) -> TransportState {
        self.transport.seek_resolved(&self.clips)
    }

    pub fn advance_playback(&mut self, reported: TimeUs) -> PlaybackStep {
        self.transport.advance(&self.clips, reported)
    }

    // ---- Drag ----

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Start dragging a clip body. Library clips may be dragged onto a track.
    pub fn begin_move_drag(&mut self, clip_id: Uuid, track: TrackId) -> Result<()> {
        if self.drag.is_some() {
            return Err(CoreError::DragInProgress);
        }
        let index = self.index_of(clip_id)?;
        self.drag = Some(DragSession::begin_move(&self.clips[index], track));
        Ok(())
    }

    pub fn begin_trim_drag(&mut self, clip_id: Uuid, edge: Edge) -> Result<()> {
        if self.drag.is_some() {
            return Err(CoreError::DragInProgress);
        }
        let clip = self.placed_clip(clip_id)?;
        let track = clip.track.ok_or(CoreError::ClipNotPlaced(clip_id))?;
        let session = DragSession::begin_trim(clip, track, edge);
        self.drag = Some(session);
        Ok(())
    }

    /// Feed the cumulative pointer delta. Nothing is committed until
    /// [`end_drag`](Self::end_drag).
    pub fn update_drag(&mut self, delta: TimeUs, track: Option<TrackId>) -> Result<DragPreview> {
        let session = self.drag.as_mut().ok_or(CoreError::NoActiveDrag)?;
        session.update(delta, track);
        let (clip_id, target) = (session.clip_id(), session.target());

        match target {
            DragTarget::Move { track, raw_start } => {
                self.require_track(track)?;
                match placement::plan_move(&self.clips, &self.config.snap, clip_id, track, raw_start) {
                    Ok(plan) => {
                        let duration = self.find_clip(clip_id)?.duration();
                        Ok(DragPreview::Move {
                            track: plan.track,
                            start: plan.start,
                            end: plan.start + duration,
                            outcome: plan.outcome,
                        })
                    }
                    Err(CoreError::Placement(reason)) => Ok(DragPreview::Rejected(reason)),
                    Err(e) => Err(e),
                }
            }
            DragTarget::Trim { edge, raw_time } => {
                let trimmed = self.preview_trim(clip_id, edge, raw_time)?;
                Ok(DragPreview::Trim {
                    start: trimmed.timeline_start,
                    end: trimmed.timeline_end(),
                })
            }
        }
    }

    /// Commit the drag through the same path as a direct move or trim. The
    /// session ends even when the commit fails.
    pub fn end_drag(&mut self) -> Result<DragOutcome> {
        let session = self.drag.take().ok_or(CoreError::NoActiveDrag)?;
        let clip_id = session.clip_id();

        match (session.kind(), session.target()) {
            (DragKind::Move, DragTarget::Move { track, raw_start }) => {
                let outcome = if session.origin().placed() {
                    self.move_clip(clip_id, track, raw_start)?
                } else {
                    self.place_on_timeline(clip_id, track, DropTime::At(raw_start))?
                };
                Ok(DragOutcome::Moved(outcome))
            }
            (_, DragTarget::Trim { edge, raw_time }) => {
                self.trim_clip(clip_id, edge, raw_time)?;
                Ok(DragOutcome::Trimmed)
            }
            (DragKind::Trim(_), DragTarget::Move { .. }) => Err(CoreError::InvariantViolation(
                "trim drag produced a move target".into(),
            )),
        }
    }

    /// Drop the drag without touching the timeline. Returns false if none was active.
    pub fn cancel_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    // ---- Internals ----

    fn index_of(&self, clip_id: Uuid) -> Result<usize> {
        self.clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))
    }

    fn find_clip(&self, clip_id: Uuid) -> Result<&Clip> {
        self.index_of(clip_id).map(|i| &self.clips[i])
    }

    fn placed_clip(&self, clip_id: Uuid) -> Result<&Clip> {
        let clip = self.find_clip(clip_id)?;
        if !clip.placed() {
            return Err(CoreError::ClipNotPlaced(clip_id));
        }
        Ok(clip)
    }

    fn require_track(&self, track: TrackId) -> Result<()> {
        if self.config.has_track(track) {
            Ok(())
        } else {
            Err(CoreError::TrackNotFound(track))
        }
    }

    fn asset_duration(&self, asset_id: Uuid) -> Result<TimeUs> {
        self.assets
            .effective_duration(asset_id)
            .ok_or(CoreError::AssetNotFound(asset_id))
    }

    fn preview_trim(&self, clip_id: Uuid, edge: Edge, raw_time: TimeUs) -> Result<Clip> {
        let clip = self.placed_clip(clip_id)?;
        let asset_duration = self.asset_duration(clip.asset_id)?;
        let bounds =
            TrimBounds::for_clip(&self.clips, clip, asset_duration, self.config.min_clip_duration);
        Ok(editing::trim_edge(clip, edge, raw_time, &bounds))
    }

    fn commit_plan(&mut self, plan: &MovePlan) -> Result<()> {
        let mut next = self.clips.clone();
        plan.apply(&mut next);
        self.commit(next)
    }

    /// Validate a candidate clip list and make it current.
    fn commit(&mut self, next: Vec<Clip>) -> Result<()> {
        self.check(&next)?;
        self.clips = next;
        self.transport.clamp_to(&self.clips);
        Ok(())
    }

    fn check(&self, clips: &[Clip]) -> Result<()> {
        for clip in clips {
            validate(clip, self.asset_duration(clip.asset_id)?, self.config.min_clip_duration)?;
            if let Some(track) = clip.track {
                self.require_track(track)?;
            }
        }
        for spec in &self.config.tracks {
            validate_track_layout(clips, spec.id)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
