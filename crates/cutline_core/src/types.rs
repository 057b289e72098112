use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

/// A point or span on the timeline, in microseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);
    pub const SECOND: Self = Self(1_000_000);
    /// Latest position a clip may start at. Leaves headroom so start plus
    /// duration stays representable.
    pub const MAX_POSITION: Self = Self(i64::MAX / 4);

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Distance between two times, always non-negative.
    pub fn distance(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).saturating_abs())
    }

    /// Nearest multiple of `interval`. Halfway points round up.
    pub fn round_to(self, interval: Self) -> Self {
        if interval.0 <= 0 {
            return self;
        }
        Self(
            self.0
                .saturating_add(interval.0 / 2)
                .div_euclid(interval.0)
                .saturating_mul(interval.0),
        )
    }

    pub fn clamp_non_negative(self) -> Self {
        self.max(Self::ZERO)
    }

    /// Clamp a requested clip start into `[0, MAX_POSITION]`.
    pub fn clamp_position(self) -> Self {
        self.clamp(Self::ZERO, Self::MAX_POSITION)
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

// ---------------------------------------------------------------------------
// SourceHandle / AssetOrigin
// ---------------------------------------------------------------------------

/// Reference to decodable bytes owned by the media layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceHandle {
    Path(PathBuf),
    Uri(String),
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceHandle::Path(p) => write!(f, "{}", p.display()),
            SourceHandle::Uri(u) => f.write_str(u),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetOrigin {
    #[default]
    Imported,
    ScreenCapture,
    Webcam,
}

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(pub u32);

impl TrackId {
    pub const MAIN: Self = Self(0);
    pub const OVERLAY: Self = Self(1);
    pub const AUDIO: Self = Self(2);
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Overlay,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackSpec {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
}

impl TrackSpec {
    pub fn new(id: u32, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId(id),
            name: name.into(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Edit inputs
// ---------------------------------------------------------------------------

/// Which edge of a clip a trim drags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Where a library clip lands when it is put on the timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DropTime {
    /// Dropped at a pointer position.
    At(TimeUs),
    /// Added without a position ("add to timeline" button).
    Auto,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_us_add_sub() {
        let a = TimeUs(5_000_000);
        let b = TimeUs(3_000_000);
        assert_eq!(a + b, TimeUs(8_000_000));
        assert_eq!(a - b, TimeUs(2_000_000));
    }

    #[test]
    fn time_us_arithmetic_saturates() {
        let huge = TimeUs::from_seconds(1e13);
        assert_eq!(huge, TimeUs(i64::MAX));
        assert_eq!(huge + TimeUs::SECOND, TimeUs(i64::MAX));
        assert_eq!(TimeUs(i64::MIN) - TimeUs::SECOND, TimeUs(i64::MIN));
        assert_eq!(huge.distance(TimeUs(-5)), TimeUs(i64::MAX));
        assert!(huge.round_to(TimeUs::SECOND) <= huge);
        assert_eq!(huge.clamp_position(), TimeUs::MAX_POSITION);
        assert_eq!(TimeUs(-3).clamp_position(), TimeUs::ZERO);
    }

    #[test]
    fn time_us_from_seconds_rounds() {
        assert_eq!(TimeUs::from_seconds(2.5), TimeUs(2_500_000));
        assert_eq!(TimeUs::from_seconds(4.95), TimeUs(4_950_000));
        assert_eq!(TimeUs::from_seconds(0.1), TimeUs(100_000));
        assert!((TimeUs(2_500_000).as_seconds() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn time_us_display() {
        assert_eq!(TimeUs(0).to_string(), "00:00:00.000");
        assert_eq!(TimeUs(1_500_000).to_string(), "00:00:01.500");
        assert_eq!(TimeUs::from_seconds(3661.5).to_string(), "01:01:01.500");
        assert_eq!(TimeUs(-2_000_000).to_string(), "-00:00:02.000");
    }

    #[test]
    fn time_us_round_to_grid() {
        let s = TimeUs::SECOND;
        assert_eq!(TimeUs(4_950_000).round_to(s), TimeUs(5_000_000));
        assert_eq!(TimeUs(4_400_000).round_to(s), TimeUs(4_000_000));
        assert_eq!(TimeUs(4_500_000).round_to(s), TimeUs(5_000_000));
        assert_eq!(TimeUs(120_000).round_to(s), TimeUs::ZERO);
        assert_eq!(TimeUs(1_234).round_to(TimeUs::ZERO), TimeUs(1_234));
    }

    #[test]
    fn time_us_distance_is_symmetric() {
        let a = TimeUs(1_000_000);
        let b = TimeUs(3_500_000);
        assert_eq!(a.distance(b), TimeUs(2_500_000));
        assert_eq!(b.distance(a), TimeUs(2_500_000));
    }

    #[test]
    fn time_us_mul_div() {
        let t = TimeUs(2_000_000);
        assert_eq!(t * 3, TimeUs(6_000_000));
        assert_eq!(t / 2, TimeUs(1_000_000));
    }

    #[test]
    fn source_handle_display() {
        let p = SourceHandle::Path(PathBuf::from("/media/take1.mp4"));
        assert_eq!(p.to_string(), "/media/take1.mp4");
        let u = SourceHandle::Uri("blob:capture-3".into());
        assert_eq!(u.to_string(), "blob:capture-3");
    }

    #[test]
    fn serde_roundtrip_drop_time() {
        let d = DropTime::At(TimeUs(3_000_000));
        let json = serde_json::to_string(&d).unwrap();
        let back: DropTime = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
