//! Raw sensor recording for training data
//!
//! The recorder is the detector without a model: every tick reads the
//! sensors and appends one row to the sensor log. A failed read still
//! produces a row, with empty temperature and humidity, so gaps stay visible
//! in the data and the training step drops them.

use crate::logfile::{LogError, SensorLog, SensorRecord};
use crate::reading::Reading;
use crate::time::TimeSource;
use crate::traits::SensorSource;

/// Counters kept across ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderStats {
    /// Rows appended, including rows for failed reads
    pub rows: u64,
    /// Reads that failed
    pub failed_reads: u64,
    /// Rows that could not be written
    pub log_failures: u64,
}

/// Reads a sensor and appends every tick to a [`SensorLog`]
pub struct Recorder<S: SensorSource, T: TimeSource> {
    sensor: S,
    clock: T,
    log: SensorLog,
    stats: RecorderStats,
}

impl<S: SensorSource, T: TimeSource> Recorder<S, T> {
    /// `clock` stamps rows for failed reads
    pub fn new(sensor: S, clock: T, log: SensorLog) -> Self {
        Self {
            sensor,
            clock,
            log,
            stats: RecorderStats::default(),
        }
    }

    /// Read once and append the row
    ///
    /// Returns the reading, or `None` when the read failed. Write failures
    /// are counted and logged, never returned.
    pub fn tick(&mut self) -> Option<Reading> {
        let (record, reading) = match self.sensor.read() {
            Ok(reading) => (SensorRecord::from_reading(&reading), Some(reading)),
            Err(e) => {
                self.stats.failed_reads += 1;
                log::warn!("{} read failed: {}", self.sensor.name(), e);
                let motion = self.sensor.last_motion().unwrap_or(false);
                (SensorRecord::missing(self.clock.now(), motion), None)
            }
        };

        match self.log.append(&record) {
            Ok(()) => self.stats.rows += 1,
            Err(e) => self.on_log_error(e),
        }

        if let Some(r) = &reading {
            log::info!(
                "temp {:.1}C humidity {:.1}% motion {}",
                r.temperature,
                r.humidity,
                r.motion_level()
            );
        }
        reading
    }

    fn on_log_error(&mut self, e: LogError) {
        self.stats.log_failures += 1;
        log::warn!("{}", e);
    }

    /// Counters since construction
    pub fn stats(&self) -> &RecorderStats {
        &self.stats
    }

    /// Borrow the sensor log
    pub fn log(&self) -> &SensorLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{SensorError, SensorResult};
    use crate::logfile::SENSOR_LOG_HEADER;
    use crate::time::FixedTime;
    use std::fs;

    struct Flaky {
        clock: FixedTime,
        calls: u32,
        motion: Option<bool>,
    }

    impl SensorSource for Flaky {
        fn read(&mut self) -> SensorResult<Reading> {
            self.calls += 1;
            self.motion = Some(self.calls % 2 == 0);
            if self.calls == 2 {
                return Err(SensorError::Timeout { waited_us: 100 });
            }
            Ok(Reading::new(21.0, 45.0, self.motion == Some(true), self.clock.now()))
        }

        fn last_motion(&self) -> Option<bool> {
            self.motion
        }
    }

    #[test]
    fn failed_read_writes_empty_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_log.csv");
        let log = SensorLog::new(&path);
        log.ensure_header().unwrap();

        let sensor = Flaky { clock: FixedTime::epoch(), calls: 0, motion: None };
        let mut recorder = Recorder::new(sensor, FixedTime::epoch(), log);

        assert!(recorder.tick().is_some());
        assert!(recorder.tick().is_none());
        assert!(recorder.tick().is_some());

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                SENSOR_LOG_HEADER,
                "2024-01-01 00:00:00,21.0,45,0",
                "2024-01-01 00:00:00,,,1",
                "2024-01-01 00:00:00,21.0,45,0",
            ]
        );
        assert_eq!(recorder.stats().rows, 3);
        assert_eq!(recorder.stats().failed_reads, 1);
    }
}
