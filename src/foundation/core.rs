use crate::foundation::error::{TfError, TfResult};

pub use kurbo::{Affine, Point, Vec2};

/// Sample time in microseconds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Timestamp from microseconds.
    pub fn from_micros(us: i64) -> Self {
        Self(us)
    }

    /// Timestamp from milliseconds, saturating on overflow.
    pub fn from_millis(ms: i64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    /// Timestamp from whole seconds, saturating on overflow.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// Timestamp from fractional seconds, rounded to the nearest microsecond.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1_000_000.0).round() as i64)
    }

    /// Microseconds value.
    pub fn as_micros(self) -> i64 {
        self.0
    }

    /// Value in seconds.
    pub fn as_secs_f64(self) -> f64 {
        (self.0 as f64) / 1_000_000.0
    }

    /// Microseconds from `earlier` to `self`, saturating at zero.
    pub fn micros_since(self, earlier: Timestamp) -> u64 {
        u64::try_from(self.0.saturating_sub(earlier.0)).unwrap_or(0)
    }
}

/// Ordered pair of frame names: an edge's declared direction, or a consumer's request.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FramePair {
    /// Source frame name.
    pub from: String,
    /// Target frame name.
    pub to: String,
}

impl FramePair {
    /// Pair `from -> to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for FramePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Frame names are non-empty ASCII alphanumerics plus `_`.
pub fn validate_frame_name(name: &str) -> TfResult<()> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(TfError::invalid_frame_name(name));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
