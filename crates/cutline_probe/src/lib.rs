pub mod error;
pub mod probe;
pub mod worker;

pub use error::{ProbeError, Result};
pub use probe::{parse_probe_json, probe_duration};
pub use worker::{apply_report, ProbeQueue, ProbeReport};
