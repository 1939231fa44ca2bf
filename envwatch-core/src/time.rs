//! Time management for the detector
//!
//! Readings carry local wall-clock timestamps because the anomaly log is read
//! by humans and dashboards, not used for rate calculations:
//! - `LocalClock`: the system's local time (requires std)
//! - `FixedTime`: controllable time for tests

use chrono::{Duration, NaiveDate, NaiveDateTime};
use core::fmt;

/// Local date and time, second resolution in the logs
pub type Timestamp = NaiveDateTime;

/// Timestamp layout used in every CSV log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp
    fn now(&self) -> Timestamp;
}

/// System local time (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

#[cfg(feature = "std")]
impl TimeSource for LocalClock {
    fn now(&self) -> Timestamp {
        chrono::Local::now().naive_local()
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Start at 2024-01-01 00:00:00
    pub fn epoch() -> Self {
        let timestamp = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self { timestamp }
    }

    /// Move forward by `secs` seconds
    pub fn advance(&mut self, secs: i64) {
        self.timestamp += Duration::seconds(secs);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Format a timestamp the way the CSV logs store it
pub fn format_timestamp(ts: &Timestamp) -> impl fmt::Display + '_ {
    ts.format(TIMESTAMP_FORMAT)
}
