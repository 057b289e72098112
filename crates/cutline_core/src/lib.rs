pub mod clip;
pub mod config;
pub mod drag;
pub mod editing;
pub mod edl;
pub mod error;
pub mod placement;
pub mod playhead;
pub mod registry;
pub mod snapping;
pub mod timeline;
pub mod types;

pub use error::{CoreError, Result};
pub use timeline::Timeline;
