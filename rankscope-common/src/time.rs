//! Timestamp utilities
//!
//! Cache expiry and daily key rollover both read time through [`Clock`] so
//! tests can move time forward without sleeping.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Calendar-day bucket (`YYYY-MM-DD`, UTC) used as the last segment of cache keys
pub fn date_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    /// Current time as Unix epoch milliseconds
    fn now_millis(&self) -> i64;

    /// Current time as a UTC timestamp
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_millis())
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_millis),
        }
    }

    /// Start the clock at the given timestamp
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self::new(at.timestamp_millis())
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn advance_hours(&self, hours: i64) {
        self.advance_millis(hours * 60 * 60 * 1000);
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_millis_to_duration_one_second() {
        let duration = millis_to_duration(1000);
        assert_eq!(duration, Duration::from_secs(1));
    }

    #[test]
    fn test_date_bucket_is_utc_day() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(date_bucket(at), "2025-03-09");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance_millis(500);
        assert_eq!(clock.now_millis(), 1_500);

        clock.advance_hours(1);
        assert_eq!(clock.now_millis(), 1_500 + 3_600_000);
    }

    #[test]
    fn test_manual_clock_rolls_date_bucket() {
        let start = Utc.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);
        assert_eq!(date_bucket(clock.now()), "2025-03-09");

        clock.advance_hours(2);
        assert_eq!(date_bucket(clock.now()), "2025-03-10");
    }

    #[test]
    fn test_system_clock_tracks_utc_now() {
        let before = Utc::now().timestamp_millis();
        let observed = SystemClock.now_millis();
        assert!(observed >= before);
    }
}
