//! Microsecond-precision timestamp type
//!
//! Timestamps are stored as microseconds since Unix epoch and are the
//! canonical time representation for session bookkeeping and TTL handling.
//! Never expose raw arithmetic; use the explicit constructors and accessors.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microsecond-precision timestamp
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are always in microseconds
/// - Timestamps are comparable and orderable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create a timestamp for the current moment
    ///
    /// Uses system time. Returns epoch (0) if the system clock is before the
    /// Unix epoch (e.g., clock went backwards due to NTP adjustment).
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1_000))
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get milliseconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Add a duration to this timestamp, saturating at the maximum
    pub fn saturating_add(&self, duration: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Compute the duration since an earlier timestamp
    ///
    /// Returns `None` if `earlier` is actually later than `self`.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        if self.0 >= earlier.0 {
            Some(Duration::from_micros(self.0 - earlier.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_epoch() {
        assert!(Timestamp::now() > Timestamp::EPOCH);
    }

    #[test]
    fn test_from_micros_round_trip() {
        let ts = Timestamp::from_micros(1_000_000_000);
        assert_eq!(ts.as_micros(), 1_000_000_000);
        assert_eq!(ts.as_millis(), 1_000_000);
    }

    #[test]
    fn test_from_millis() {
        let ts = Timestamp::from_millis(1_500);
        assert_eq!(ts.as_micros(), 1_500_000);
    }

    #[test]
    fn test_saturating_add() {
        let ts = Timestamp::from_micros(100);
        let later = ts.saturating_add(Duration::from_micros(50));
        assert_eq!(later.as_micros(), 150);

        let max = Timestamp::from_micros(u64::MAX);
        assert_eq!(max.saturating_add(Duration::from_secs(1)).as_micros(), u64::MAX);
    }

    #[test]
    fn test_duration_since() {
        let earlier = Timestamp::from_micros(100);
        let later = Timestamp::from_micros(350);

        assert_eq!(
            later.duration_since(earlier),
            Some(Duration::from_micros(250))
        );
        assert_eq!(earlier.duration_since(later), None);
    }

    #[test]
    fn test_ordering() {
        let a = Timestamp::from_micros(1);
        let b = Timestamp::from_micros(2);
        assert!(a < b);
    }

    #[test]
    fn test_serde_round_trip() {
        let ts = Timestamp::from_micros(42);
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
