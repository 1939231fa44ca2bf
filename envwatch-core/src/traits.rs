//! Extension points of the detection loop
//!
//! The detector only sees these traits, so the same loop runs against real
//! GPIO, a simulated sensor, or the scripted fakes used in tests:
//!
//! - [`SensorSource`]: one (temperature, humidity, motion) acquisition per tick
//! - [`AnomalyScorer`]: window mean in, verdict out
//! - [`AlertLine`]: one digital output (buzzer, LED)
//! - [`AnomalySink`]: where scored ticks are recorded
//!
//! All calls are synchronous and happen strictly in that order within a tick.

use alloc::boxed::Box;
use core::fmt;

use crate::errors::{ActuatorError, ScoreError, SensorResult};
use crate::reading::{FeatureVector, Reading};
use crate::verdict::{Scored, Verdict};

/// Acquires one reading per call
///
/// ## Implementation Requirements
///
/// - Transient hardware failures return `Err`, never panic
/// - A failed read has no side effects visible to the detector
/// - Motion is sampled on every call, even when the DHT read fails
pub trait SensorSource {
    /// Take one reading
    fn read(&mut self) -> SensorResult<Reading>;

    /// Motion level sampled by the last `read`, successful or not
    ///
    /// `None` if nothing was sampled yet or the source has no motion input.
    fn last_motion(&self) -> Option<bool> {
        None
    }

    /// Name used in log messages
    fn name(&self) -> &'static str {
        "sensor"
    }
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn read(&mut self) -> SensorResult<Reading> {
        (**self).read()
    }

    fn last_motion(&self) -> Option<bool> {
        (**self).last_motion()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Turns a window mean into a verdict
///
/// Implementations own the scaler and model; both are immutable after
/// construction, so scoring the same vector twice yields the same verdict.
pub trait AnomalyScorer {
    /// Standardize and classify
    fn score(&self, mean: &FeatureVector) -> Result<Scored, ScoreError>;
}

impl<C: AnomalyScorer + ?Sized> AnomalyScorer for Box<C> {
    fn score(&self, mean: &FeatureVector) -> Result<Scored, ScoreError> {
        (**self).score(mean)
    }
}

/// A single digital alert output
pub trait AlertLine {
    /// Drive the line: `true` = asserted (buzzer on, LED lit)
    fn set_level(&mut self, asserted: bool) -> Result<(), ActuatorError>;

    /// Level last driven onto the line
    fn is_asserted(&self) -> bool;

    /// Label for log messages
    fn label(&self) -> &'static str;
}

/// Records scored ticks
///
/// The detector treats every error from a sink as non-fatal.
pub trait AnomalySink {
    /// Error reported back to the detector
    type Error: fmt::Display;

    /// Record the latest reading of a scored tick with its verdict
    fn record(&mut self, reading: &Reading, verdict: Verdict) -> Result<(), Self::Error>;
}
