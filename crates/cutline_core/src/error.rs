use thiserror::Error;
use uuid::Uuid;

use crate::types::TrackId;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("new position overlaps more than one clip")]
    MultiOverlap,

    #[error("overlap with clip {0} could not be resolved")]
    Blocked(Uuid),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clip not found: {0}")]
    ClipNotFound(Uuid),

    #[error("Asset not found: {0}")]
    AssetNotFound(Uuid),

    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Clip is not on the timeline: {0}")]
    ClipNotPlaced(Uuid),

    #[error("Asset {0} is still referenced by clips")]
    AssetInUse(Uuid),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Placement failed: {0}")]
    Placement(#[from] PlacementError),

    #[error("Asset {0} is shorter than the minimum clip duration")]
    AssetTooShort(Uuid),

    #[error("Range is shorter than the minimum clip duration")]
    RangeTooShort,

    #[error("A drag is already in progress")]
    DragInProgress,

    #[error("No drag in progress")]
    NoActiveDrag,
}

pub type Result<T> = std::result::Result<T, CoreError>;
