//! Error Types for the Detection Loop
//!
//! ## Error Taxonomy
//!
//! Every error in this crate falls in one of two groups, and the detector
//! treats the groups very differently:
//!
//! ### Recoverable
//! - [`SensorError`]: a transient acquisition failure (checksum, timing,
//!   missing value). The tick is skipped, the window is untouched, and the
//!   loop carries on at the next interval.
//! - [`ActuatorError`]: an alert line could not be driven. Reported, the
//!   verdict still gets logged.
//! - Log write failures (see [`crate::logfile::LogError`]). Reported only.
//!
//! ### Fatal
//! - [`ScoreError`]: the scaler or model produced something that cannot be
//!   trusted (zero scale, non-finite output). Every later verdict would be
//!   garbage as well, so the detector stops with [`DetectorError`].
//!
//! ```rust
//! use envwatch_core::errors::SensorError;
//!
//! fn on_read_failure(err: SensorError) {
//!     match err {
//!         SensorError::Checksum { .. } | SensorError::Timeout { .. } => {
//!             // Single-wire glitch, try again next tick
//!         }
//!         SensorError::MissingValue { .. } | SensorError::Implausible { .. } => {
//!             // Driver gave us nothing usable, skip the tick
//!         }
//!         SensorError::Bus { .. } => {
//!             // GPIO access problem, still transient from the loop's view
//!         }
//!     }
//! }
//! ```
//!
//! All error types in this module are `Copy` and carry only inline data, the
//! same shape the hot path already uses for readings.

use thiserror_no_std::Error;

/// Result type for sensor acquisition
pub type SensorResult<T> = Result<T, SensorError>;

/// Transient sensor acquisition failures
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SensorError {
    /// Sensor did not answer, or a pulse never ended
    #[error("sensor timed out after {waited_us}us")]
    Timeout {
        /// How long we waited before giving up
        waited_us: u32,
    },

    /// Frame arrived but its checksum byte does not match
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum {
        /// Checksum computed from the payload bytes
        expected: u8,
        /// Checksum byte sent by the sensor
        actual: u8,
    },

    /// Driver produced no value for a channel
    #[error("no value for {channel}")]
    MissingValue {
        /// Channel name ("temperature", "humidity")
        channel: &'static str,
    },

    /// Value is not physically possible (NaN, humidity above 100%, ...)
    #[error("implausible {channel} reading: {value}")]
    Implausible {
        /// Channel name
        channel: &'static str,
        /// The offending value
        value: f64,
    },

    /// GPIO line could not be accessed for this read
    #[error("sensor bus error: {reason}")]
    Bus {
        /// Short description from the driver
        reason: &'static str,
    },
}

/// Rolling window construction errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// A window must hold at least one reading
    #[error("rolling window capacity must be at least 1")]
    ZeroCapacity,
}

/// Alert output failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Line could not be driven to the requested level
    #[error("failed to drive {line} output: {reason}")]
    Line {
        /// Line label ("buzzer", "led")
        line: &'static str,
        /// Short description from the driver
        reason: &'static str,
    },
}

/// Scoring failures; all of them are fatal for the detector
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ScoreError {
    /// Scaler has a zero or non-finite scale for a feature
    #[error("scaler has degenerate scale {scale} for feature {feature}")]
    DegenerateScale {
        /// Feature index (0 = temperature, 1 = humidity, 2 = motion)
        feature: usize,
        /// The stored scale value
        scale: f64,
    },

    /// Standardized value or model output is NaN or infinite
    #[error("non-finite value while scoring feature {feature}")]
    NonFinite {
        /// Feature index, or `FEATURE_COUNT` for the model output
        feature: usize,
    },
}

/// Errors that stop the detector
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DetectorError {
    /// Scorer failed; no valid verdicts can be produced
    #[error("scoring failed: {0}")]
    Score(ScoreError),
}

impl From<ScoreError> for DetectorError {
    fn from(err: ScoreError) -> Self {
        DetectorError::Score(err)
    }
}
