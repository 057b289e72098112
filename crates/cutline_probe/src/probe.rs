use cutline_core::types::TimeUs;
use serde::Deserialize;
use std::path::Path;

use crate::error::{ProbeError, Result};

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run ffprobe on a media file without blocking the runtime and return its
/// duration.
pub async fn probe_duration(path: impl AsRef<Path>) -> Result<TimeUs> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| ProbeError::FfprobeExec(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::FfprobeFailed(stderr.into_owned()));
    }

    parse_probe_json(&output.stdout)?.ok_or_else(|| ProbeError::NoDuration(path.to_path_buf()))
}

/// Duration from raw `ffprobe -print_format json` output. `None` when the
/// file reports none (live captures, some WebM recordings).
pub fn parse_probe_json(bytes: &[u8]) -> Result<Option<TimeUs>> {
    let probe: FfprobeOutput = serde_json::from_slice(bytes)?;

    // Container duration first, then the longest stream duration
    Ok(parse_duration(probe.format.duration.as_deref()).or_else(|| {
        probe
            .streams
            .iter()
            .filter_map(|s| parse_duration(s.duration.as_deref()))
            .max()
    }))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Seconds string to a positive duration. ffprobe prints "N/A" for unknown.
fn parse_duration(value: Option<&str>) -> Option<TimeUs> {
    let seconds = value?.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    let duration = TimeUs::from_seconds(seconds);
    (duration > TimeUs::ZERO).then_some(duration)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_rejects_unknown_and_zero() {
        assert_eq!(parse_duration(Some("12.25")), Some(TimeUs(12_250_000)));
        assert_eq!(parse_duration(Some("N/A")), None);
        assert_eq!(parse_duration(Some("0.000000")), None);
        assert_eq!(parse_duration(Some("-1")), None);
        assert_eq!(parse_duration(None), None);
    }

    #[test]
    fn container_duration_preferred() {
        let json = br#"{
            "streams": [
                { "codec_type": "video", "codec_name": "h264", "duration": "10.4" },
                { "codec_type": "audio", "codec_name": "aac" }
            ],
            "format": { "duration": "10.5" }
        }"#;
        assert_eq!(parse_probe_json(json).unwrap(), Some(TimeUs::from_seconds(10.5)));
    }

    #[test]
    fn stream_duration_used_when_container_has_none() {
        let json = br#"{
            "streams": [
                { "codec_type": "video", "codec_name": "vp8", "duration": "4.0" },
                { "codec_type": "audio", "codec_name": "opus", "duration": "4.2" }
            ],
            "format": { "duration": "N/A" }
        }"#;
        assert_eq!(parse_probe_json(json).unwrap(), Some(TimeUs::from_seconds(4.2)));
    }

    #[test]
    fn parse_missing_streams() {
        assert_eq!(parse_probe_json(br#"{ "format": {} }"#).unwrap(), None);
    }

    #[test]
    fn parse_invalid_json_fails() {
        assert!(matches!(
            parse_probe_json(b"not json"),
            Err(ProbeError::Json(_))
        ));
    }

    #[tokio::test]
    async fn probe_nonexistent_file_returns_error() {
        let result = probe_duration("/tmp/does_not_exist_cutline_probe_test.mp4").await;
        assert!(matches!(result, Err(ProbeError::FileNotFound(_))));
    }
}
