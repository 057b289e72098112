//! Background probing.
//!
//! Probes run as tokio tasks and report back over a channel. The timeline
//! stays single-threaded: whoever owns it drains the queue and applies each
//! report with [`apply_report`].

use cutline_core::timeline::Timeline;
use cutline_core::types::TimeUs;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::probe::probe_duration;

#[derive(Debug)]
pub struct ProbeReport {
    pub asset_id: Uuid,
    pub outcome: Result<TimeUs>,
}

pub struct ProbeQueue {
    tx: mpsc::UnboundedSender<ProbeReport>,
    rx: mpsc::UnboundedReceiver<ProbeReport>,
    pending: usize,
}

impl Default for ProbeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, pending: 0 }
    }

    /// Start probing `path` for `asset_id`. Must be called inside a runtime.
    pub fn submit(&mut self, asset_id: Uuid, path: PathBuf) {
        debug!(asset = %asset_id, path = %path.display(), "probe submitted");
        let tx = self.tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let outcome = probe_duration(&path).await;
            let _ = tx.send(ProbeReport { asset_id, outcome });
        });
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Next finished probe, in completion order. `None` once nothing is pending.
    pub async fn next(&mut self) -> Option<ProbeReport> {
        if self.pending == 0 {
            return None;
        }
        // The queue holds a sender, so the channel never closes under us
        let report = self.rx.recv().await?;
        self.pending -= 1;
        Some(report)
    }

    /// Wait for every pending probe and apply it to `timeline`.
    pub async fn drain_into(&mut self, timeline: &mut Timeline) -> usize {
        let mut applied = 0;
        while let Some(report) = self.next().await {
            apply_report(timeline, report);
            applied += 1;
        }
        applied
    }
}

/// Feed one probe result to the timeline. Failures fall back to the
/// configured default duration.
pub fn apply_report(timeline: &mut Timeline, report: ProbeReport) {
    match report.outcome {
        Ok(duration) => {
            debug!(asset = %report.asset_id, %duration, "probe finished");
            timeline.set_asset_duration(report.asset_id, duration);
        }
        Err(e) => {
            warn!(asset = %report.asset_id, error = %e, "probe failed");
            timeline.mark_probe_failed(report.asset_id);
        }
    }
}
