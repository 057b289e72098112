//! Playhead queries and the playback transport.
//!
//! Everything here is derived from the clip set on demand. Nothing caches
//! the "current clip"; the transport only stores the playhead position and
//! its state.

use crate::clip::{clips_on_track, Clip};
use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// The placed clip on `track` containing `time`, end-exclusive.
pub fn active_clip(clips: &[Clip], track: TrackId, time: TimeUs) -> Option<&Clip> {
    clips.iter().find(|c| c.is_on(track) && c.contains(time))
}

/// Offset of `time` from the start of `clip`.
pub fn relative_offset(clip: &Clip, time: TimeUs) -> TimeUs {
    time - clip.timeline_start
}

/// Position inside the asset to seek the decoder to.
pub fn source_position(clip: &Clip, time: TimeUs) -> TimeUs {
    clip.source_in + relative_offset(clip, time)
}

/// Latest end of any placed clip, 0 when nothing is placed.
pub fn total_duration(clips: &[Clip]) -> TimeUs {
    clips
        .iter()
        .filter(|c| c.placed())
        .map(|c| c.timeline_end())
        .max()
        .unwrap_or(TimeUs::ZERO)
}

/// Earliest placed clip on `track` starting at or after `time`.
pub fn next_clip_after(clips: &[Clip], track: TrackId, time: TimeUs) -> Option<&Clip> {
    clips_on_track(clips, track)
        .into_iter()
        .find(|c| c.timeline_start >= time)
}

/// What one track shows at a given time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameSource {
    pub track: TrackId,
    pub clip_id: Uuid,
    pub asset_id: Uuid,
    pub source_position: TimeUs,
}

/// Resolve every track that has an active clip at `time`, in track order.
pub fn resolve_frame(clips: &[Clip], time: TimeUs) -> Vec<FrameSource> {
    let mut tracks: Vec<TrackId> = clips.iter().filter_map(|c| c.track).collect();
    tracks.sort();
    tracks.dedup();

    tracks
        .into_iter()
        .filter_map(|track| {
            active_clip(clips, track, time).map(|clip| FrameSource {
                track,
                clip_id: clip.id,
                asset_id: clip.asset_id,
                source_position: source_position(clip, time),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    /// Waiting for the player to land on a new position. `resume` restarts
    /// playback once the seek resolves.
    SeekPending { resume: bool },
}

/// Result of feeding a player time report to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Not playing; the report was ignored.
    Idle,
    /// Still inside the current clip.
    Continued,
    /// Jumped to the start of another clip.
    Advanced { to: Uuid },
    /// No clip left on the driving track; playback stopped.
    Ended,
}

/// Playback state for the track that drives the master clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transport {
    state: TransportState,
    position: TimeUs,
    track: TrackId,
}

impl Transport {
    pub fn new(track: TrackId) -> Self {
        Self {
            state: TransportState::Stopped,
            position: TimeUs::ZERO,
            track,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn position(&self) -> TimeUs {
        self.position
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Start playback. Returns false when there is nothing left to play.
    pub fn play(&mut self, clips: &[Clip]) -> bool {
        match self.state {
            TransportState::Playing => true,
            TransportState::SeekPending { .. } => {
                self.state = TransportState::SeekPending { resume: true };
                true
            }
            TransportState::Stopped => {
                if active_clip(clips, self.track, self.position).is_none() {
                    let Some(next) = next_clip_after(clips, self.track, self.position) else {
                        debug!(position = %self.position, "play ignored, no clip ahead");
                        return false;
                    };
                    self.position = next.timeline_start;
                }
                self.state = TransportState::Playing;
                debug!(position = %self.position, "playback started");
                true
            }
        }
    }

    /// Stop playing. A pending seek stays pending but will not resume.
    pub fn pause(&mut self) {
        self.state = match self.state {
            TransportState::Playing => {
                debug!(position = %self.position, "playback paused");
                TransportState::Stopped
            }
            TransportState::SeekPending { .. } => TransportState::SeekPending { resume: false },
            TransportState::Stopped => TransportState::Stopped,
        };
    }

    /// Move the playhead. The position is clamped to the arrangement.
    pub fn seek(&mut self, clips: &[Clip], time: TimeUs) {
        let resume = match self.state {
            TransportState::Playing => true,
            TransportState::SeekPending { resume } => resume,
            TransportState::Stopped => false,
        };
        self.position = time.clamp_non_negative().min(total_duration(clips));
        self.state = TransportState::SeekPending { resume };
    }

    /// Pull the playhead back inside the arrangement after an edit.
    pub fn clamp_to(&mut self, clips: &[Clip]) {
        self.position = self.position.min(total_duration(clips));
    }

    /// The player reached the sought position.
    pub fn seek_resolved(&mut self, clips: &[Clip]) -> TransportState {
        if let TransportState::SeekPending { resume } = self.state {
            self.state = TransportState::Stopped;
            if resume {
                self.play(clips);
            }
        }
        self.state
    }

    /// Feed the time reported by the player while playing.
    pub fn advance(&mut self, clips: &[Clip], reported: TimeUs) -> PlaybackStep {
        if self.state != TransportState::Playing {
            return PlaybackStep::Idle;
        }

        let boundary = match active_clip(clips, self.track, self.position) {
            Some(current) if reported < current.timeline_end() => {
                self.position = reported.max(current.timeline_start);
                return PlaybackStep::Continued;
            }
            Some(current) => current.timeline_end(),
            // Clips changed under the playhead; continue from here
            None => self.position,
        };

        match next_clip_after(clips, self.track, boundary) {
            Some(next) => {
                self.position = next.timeline_start;
                debug!(clip = %next.id, position = %self.position, "advanced to next clip");
                PlaybackStep::Advanced { to: next.id }
            }
            None => {
                self.position = boundary;
                self.state = TransportState::Stopped;
                debug!(position = %self.position, "playback reached the end");
                PlaybackStep::Ended
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: i64 = 1_000_000;

    fn clip_at(track: u32, start_s: f64, end_s: f64) -> Clip {
        let start = TimeUs::from_seconds(start_s);
        let end = TimeUs::from_seconds(end_s);
        let mut clip = Clip::from_asset(Uuid::new_v4(), "clip", end - start);
        clip.place(TrackId(track), start);
        clip
    }

    fn secs(s: f64) -> TimeUs {
        TimeUs::from_seconds(s)
    }

    // -----------------------------------------------------------------------
    // queries
    // -----------------------------------------------------------------------

    #[test]
    fn active_clip_is_end_exclusive() {
        let clips = vec![clip_at(0, 2.0, 5.0)];
        assert_eq!(active_clip(&clips, TrackId(0), secs(2.0)).map(|c| c.id), Some(clips[0].id));
        assert_eq!(active_clip(&clips, TrackId(0), secs(4.999)).map(|c| c.id), Some(clips[0].id));
        assert!(active_clip(&clips, TrackId(0), secs(5.0)).is_none());
    }

    #[test]
    fn contiguous_clip_owns_shared_boundary() {
        let clips = vec![clip_at(0, 2.0, 5.0), clip_at(0, 5.0, 7.0)];
        assert_eq!(active_clip(&clips, TrackId(0), secs(5.0)).map(|c| c.id), Some(clips[1].id));
    }

    #[test]
    fn active_clip_ignores_other_tracks_and_library() {
        let mut library = Clip::from_asset(Uuid::new_v4(), "lib", TimeUs(10 * SECOND));
        library.unplace();
        let clips = vec![clip_at(1, 0.0, 10.0), library];
        assert!(active_clip(&clips, TrackId(0), secs(1.0)).is_none());
    }

    #[test]
    fn offsets_include_source_in() {
        let mut clip = clip_at(0, 4.0, 6.0);
        clip.source_in = secs(10.0);
        clip.source_out = secs(12.0);
        assert_eq!(relative_offset(&clip, secs(4.5)), secs(0.5));
        assert_eq!(source_position(&clip, secs(4.5)), secs(10.5));
    }

    #[test]
    fn total_duration_spans_all_tracks() {
        let clips = vec![clip_at(0, 0.0, 10.0), clip_at(1, 3.0, 6.0)];
        assert_eq!(total_duration(&clips), secs(10.0));
        assert_eq!(total_duration(&[]), TimeUs::ZERO);
    }

    #[test]
    fn next_clip_after_picks_earliest() {
        let clips = vec![clip_at(0, 8.0, 9.0), clip_at(0, 5.0, 6.0), clip_at(1, 4.0, 4.5)];
        assert_eq!(next_clip_after(&clips, TrackId(0), secs(3.0)).map(|c| c.id), Some(clips[1].id));
        assert_eq!(next_clip_after(&clips, TrackId(0), secs(5.0)).map(|c| c.id), Some(clips[1].id));
        assert_eq!(next_clip_after(&clips, TrackId(0), secs(5.5)).map(|c| c.id), Some(clips[0].id));
        assert!(next_clip_after(&clips, TrackId(0), secs(8.5)).is_none());
    }

    #[test]
    fn resolve_frame_reports_each_active_track() {
        let clips = vec![clip_at(2, 0.0, 4.0), clip_at(0, 0.0, 10.0), clip_at(1, 6.0, 7.0)];
        let frame = resolve_frame(&clips, secs(3.0));
        assert_eq!(frame.len(), 2);
        assert_eq!(frame[0].track, TrackId(0));
        assert_eq!(frame[0].source_position, secs(3.0));
        assert_eq!(frame[1].track, TrackId(2));
    }

    // -----------------------------------------------------------------------
    // transport
    // -----------------------------------------------------------------------

    #[test]
    fn play_requires_a_clip() {
        let mut transport = Transport::new(TrackId(0));
        assert!(!transport.play(&[]));
        assert_eq!(transport.state(), TransportState::Stopped);
    }

    #[test]
    fn play_from_gap_jumps_to_next_clip() {
        let clips = vec![clip_at(0, 3.0, 5.0)];
        let mut transport = Transport::new(TrackId(0));
        assert!(transport.play(&clips));
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(transport.position(), secs(3.0));
    }

    #[test]
    fn advance_within_clip_continues() {
        let clips = vec![clip_at(0, 0.0, 5.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.play(&clips);
        assert_eq!(transport.advance(&clips, secs(2.5)), PlaybackStep::Continued);
        assert_eq!(transport.position(), secs(2.5));
    }

    #[test]
    fn advance_across_gap_jumps_to_next_start() {
        let clips = vec![clip_at(0, 0.0, 2.0), clip_at(0, 6.0, 8.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.play(&clips);
        transport.advance(&clips, secs(1.9));
        let step = transport.advance(&clips, secs(2.03));
        assert_eq!(step, PlaybackStep::Advanced { to: clips[1].id });
        assert_eq!(transport.position(), secs(6.0));
        assert!(transport.is_playing());
    }

    #[test]
    fn advance_at_last_clip_end_stops() {
        let clips = vec![clip_at(0, 0.0, 2.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.play(&clips);
        assert_eq!(transport.advance(&clips, secs(2.1)), PlaybackStep::Ended);
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position(), secs(2.0));
    }

    #[test]
    fn advance_ignored_when_stopped() {
        let clips = vec![clip_at(0, 0.0, 2.0)];
        let mut transport = Transport::new(TrackId(0));
        assert_eq!(transport.advance(&clips, secs(1.0)), PlaybackStep::Idle);
        assert_eq!(transport.position(), TimeUs::ZERO);
    }

    #[test]
    fn pause_stops() {
        let clips = vec![clip_at(0, 0.0, 2.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.play(&clips);
        transport.pause();
        assert_eq!(transport.state(), TransportState::Stopped);
    }

    #[test]
    fn pause_during_seek_keeps_seek_pending() {
        let clips = vec![clip_at(0, 0.0, 10.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.play(&clips);
        transport.seek(&clips, secs(6.0));
        transport.pause();
        assert_eq!(transport.state(), TransportState::SeekPending { resume: false });
        assert_eq!(transport.seek_resolved(&clips), TransportState::Stopped);
        assert_eq!(transport.position(), secs(6.0));
    }

    #[test]
    fn seek_while_stopped_resolves_to_stopped() {
        let clips = vec![clip_at(0, 0.0, 10.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.seek(&clips, secs(4.0));
        assert_eq!(transport.state(), TransportState::SeekPending { resume: false });
        assert_eq!(transport.seek_resolved(&clips), TransportState::Stopped);
        assert_eq!(transport.position(), secs(4.0));
    }

    #[test]
    fn seek_while_playing_resumes() {
        let clips = vec![clip_at(0, 0.0, 10.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.play(&clips);
        transport.seek(&clips, secs(7.0));
        assert_eq!(transport.state(), TransportState::SeekPending { resume: true });
        assert_eq!(transport.seek_resolved(&clips), TransportState::Playing);
    }

    #[test]
    fn play_during_seek_marks_resume() {
        let clips = vec![clip_at(0, 0.0, 10.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.seek(&clips, secs(1.0));
        assert!(transport.play(&clips));
        assert_eq!(transport.seek_resolved(&clips), TransportState::Playing);
    }

    #[test]
    fn seek_clamps_to_arrangement() {
        let clips = vec![clip_at(0, 0.0, 10.0)];
        let mut transport = Transport::new(TrackId(0));
        transport.seek(&clips, secs(42.0));
        assert_eq!(transport.position(), secs(10.0));
        transport.seek(&clips, secs(-1.0));
        assert_eq!(transport.position(), TimeUs::ZERO);
    }
}
