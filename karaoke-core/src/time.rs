//! Time conversion utilities.
//!
//! Players report positions as floating point seconds while the engine works
//! with [`Duration`]. Conversions here never panic: values that cannot be a
//! playback position are rejected instead.

use std::time::Duration;

/// Convert a position in seconds into a [`Duration`].
///
/// Returns `None` for negative, NaN or infinite values, and for values too
/// large to be represented.
#[must_use]
pub fn position_from_secs(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Extension trait for saturating Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Shift by a signed millisecond offset, saturating at zero.
    #[must_use]
    fn offset_by_millis(&self, offset_ms: i64) -> Self;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn offset_by_millis(&self, offset_ms: i64) -> Self {
        let delta = Duration::from_millis(offset_ms.unsigned_abs());
        if offset_ms >= 0 {
            self.saturating_add(delta)
        } else {
            self.saturating_sub(delta)
        }
    }
}
