//! Pointer drag bookkeeping.
//!
//! A session remembers the clip as it was when the drag began. Every update
//! replaces the cumulative pointer delta, so the target is always
//! `original + delta` and repeated updates never drift.

use crate::clip::Clip;
use crate::error::PlacementError;
use crate::placement::PlacementOutcome;
use crate::types::*;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Trim(Edge),
}

/// Where the drag would land if it ended now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Move { track: TrackId, raw_start: TimeUs },
    Trim { edge: Edge, raw_time: TimeUs },
}

/// Preview of an in-progress drag for the UI to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPreview {
    Move {
        track: TrackId,
        start: TimeUs,
        end: TimeUs,
        outcome: PlacementOutcome,
    },
    Trim {
        start: TimeUs,
        end: TimeUs,
    },
    /// The drop would be refused at this position.
    Rejected(PlacementError),
}

/// What a finished drag committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Moved(PlacementOutcome),
    Trimmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    kind: DragKind,
    origin: Clip,
    track: TrackId,
    delta: TimeUs,
}

impl DragSession {
    /// Start moving `clip`, initially over `track`.
    pub fn begin_move(clip: &Clip, track: TrackId) -> Self {
        Self {
            kind: DragKind::Move,
            origin: clip.clone(),
            track,
            delta: TimeUs::ZERO,
        }
    }

    /// Start dragging one edge of a placed clip.
    pub fn begin_trim(clip: &Clip, track: TrackId, edge: Edge) -> Self {
        Self {
            kind: DragKind::Trim(edge),
            origin: clip.clone(),
            track,
            delta: TimeUs::ZERO,
        }
    }

    pub fn clip_id(&self) -> Uuid {
        self.origin.id
    }

    pub fn kind(&self) -> DragKind {
        self.kind
    }

    /// The clip as it was before the drag.
    pub fn origin(&self) -> &Clip {
        &self.origin
    }

    /// Set the cumulative pointer delta since the drag began. Moves may also
    /// change track; trims stay on the clip's own track.
    pub fn update(&mut self, delta: TimeUs, track: Option<TrackId>) {
        self.delta = delta;
        if let (DragKind::Move, Some(track)) = (self.kind, track) {
            self.track = track;
        }
    }

    pub fn target(&self) -> DragTarget {
        match self.kind {
            DragKind::Move => DragTarget::Move {
                track: self.track,
                raw_start: self.origin.timeline_start + self.delta,
            },
            DragKind::Trim(edge) => {
                let anchor = match edge {
                    Edge::Start => self.origin.timeline_start,
                    Edge::End => self.origin.timeline_end(),
                };
                DragTarget::Trim {
                    edge,
                    raw_time: anchor + self.delta,
                }
            }
        }
    }
}
