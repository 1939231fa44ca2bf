//! Append-only CSV logs
//!
//! Two logs share one writer:
//!
//! 1. **Anomaly log**: one row per scored tick, read by dashboards
//!    ```csv
//!    Timestamp,Temperature,Humidity,Motion,Prediction
//!    2024-01-01 12:00:00,20.0,50,0,1
//!    ```
//! 2. **Sensor log**: one row per recorded reading, the training input
//!    ```csv
//!    Timestamp,Temperature,Humidity,Motion
//!    2024-01-01 12:00:00,20.0,50,0
//!    2024-01-01 12:00:02,,,1
//!    ```
//!
//! ## Guarantees
//!
//! - The header is written only when the file is created; an existing file
//!   is never truncated or rewritten.
//! - Every row is a single `write_all` on a file opened in append mode, so
//!   a concurrent reader sees whole lines.
//! - Nothing is buffered across rows. There is no fsync; the log is meant
//!   for periodic human inspection, not crash consistency.
//!
//! ## Value Formatting
//!
//! Temperature keeps at least one decimal (`20.0`), humidity is written as
//! short as possible (`50`, `50.5`). That is how the DHT driver reports them
//! and what existing dashboards already parse.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use thiserror_no_std::Error;

use crate::reading::Reading;
use crate::time::{format_timestamp, Timestamp};
use crate::traits::AnomalySink;
use crate::verdict::Verdict;

/// Header of the anomaly log
pub const ANOMALY_LOG_HEADER: &str = "Timestamp,Temperature,Humidity,Motion,Prediction";

/// Header of the sensor log
pub const SENSOR_LOG_HEADER: &str = "Timestamp,Temperature,Humidity,Motion";

/// Result type for log operations
pub type LogResult<T> = Result<T, LogError>;

/// Log I/O failures; reported by callers, never fatal
#[derive(Error, Debug)]
pub enum LogError {
    /// Parent directory could not be created
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        /// Directory path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Log file could not be opened or created
    #[error("failed to open log {path}: {source}")]
    Open {
        /// Log path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Row could not be written
    #[error("failed to write log {path}: {source}")]
    Write {
        /// Log path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// A row type with a fixed header
pub trait LogRow {
    /// Column header, without trailing newline
    const HEADER: &'static str;

    /// Append the row's fields (no trailing newline)
    fn write_fields(&self, out: &mut String);
}

/// One scored tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyRecord {
    /// Time of the latest reading
    pub timestamp: Timestamp,
    /// Latest temperature
    pub temperature: f64,
    /// Latest humidity
    pub humidity: f64,
    /// Latest motion level
    pub motion: bool,
    /// Verdict for the window mean
    pub verdict: Verdict,
}

impl AnomalyRecord {
    /// Build from the latest reading of a scored tick
    pub fn new(reading: &Reading, verdict: Verdict) -> Self {
        Self {
            timestamp: reading.timestamp,
            temperature: reading.temperature,
            humidity: reading.humidity,
            motion: reading.motion,
            verdict,
        }
    }
}

impl LogRow for AnomalyRecord {
    const HEADER: &'static str = ANOMALY_LOG_HEADER;

    fn write_fields(&self, out: &mut String) {
        let _ = write!(
            out,
            "{},{:?},{},{},{}",
            format_timestamp(&self.timestamp),
            self.temperature,
            self.humidity,
            u8::from(self.motion),
            self.verdict.prediction(),
        );
    }
}

/// One recorded reading; `values` is `None` when the DHT read failed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRecord {
    /// Acquisition time
    pub timestamp: Timestamp,
    /// (temperature, humidity), absent on a failed read
    pub values: Option<(f64, f64)>,
    /// Motion level, always sampled
    pub motion: bool,
}

impl SensorRecord {
    /// Row for a successful reading
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            timestamp: reading.timestamp,
            values: Some((reading.temperature, reading.humidity)),
            motion: reading.motion,
        }
    }

    /// Row for a failed read
    pub fn missing(timestamp: Timestamp, motion: bool) -> Self {
        Self {
            timestamp,
            values: None,
            motion,
        }
    }
}

impl LogRow for SensorRecord {
    const HEADER: &'static str = SENSOR_LOG_HEADER;

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, "{},", format_timestamp(&self.timestamp));
        if let Some((temperature, humidity)) = self.values {
            let _ = write!(out, "{:?},{}", temperature, humidity);
        } else {
            out.push(',');
        }
        let _ = write!(out, ",{}", u8::from(self.motion));
    }
}

/// Append-only CSV writer for one row type
#[derive(Debug)]
pub struct CsvLog<R: LogRow> {
    path: PathBuf,
    rows_written: usize,
    _row: PhantomData<fn(&R)>,
}

/// Writer for the anomaly log
pub type AnomalyLog = CsvLog<AnomalyRecord>;

/// Writer for the sensor log
pub type SensorLog = CsvLog<SensorRecord>;

impl<R: LogRow> CsvLog<R> {
    /// Writer for `path`; nothing is touched until the first call
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows_written: 0,
            _row: PhantomData,
        }
    }

    /// File this log appends to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended by this writer (not counting earlier runs)
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Create the file with its header if it does not exist yet
    ///
    /// Returns `true` when the file was created by this call. An existing
    /// file, empty or not, is left exactly as it is.
    pub fn ensure_header(&self) -> LogResult<bool> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LogError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(source) => return Err(self.open_error(source)),
        };

        let mut header = String::with_capacity(R::HEADER.len() + 1);
        header.push_str(R::HEADER);
        header.push('\n');
        file.write_all(header.as_bytes()).map_err(|source| self.write_error(source))?;

        log::info!("created log {} with header", self.path.display());
        Ok(true)
    }

    /// Append one row at the end of the file
    pub fn append(&mut self, row: &R) -> LogResult<()> {
        let mut line = String::with_capacity(64);
        row.write_fields(&mut line);
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.open_error(source))?;

        file.write_all(line.as_bytes()).map_err(|source| self.write_error(source))?;
        self.rows_written += 1;
        Ok(())
    }

    fn open_error(&self, source: io::Error) -> LogError {
        LogError::Open {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_error(&self, source: io::Error) -> LogError {
        LogError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl AnomalySink for AnomalyLog {
    type Error = LogError;

    fn record(&mut self, reading: &Reading, verdict: Verdict) -> Result<(), Self::Error> {
        self.append(&AnomalyRecord::new(reading, verdict))
    }
}
