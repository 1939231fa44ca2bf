//! Plausibility checks for raw readings
//!
//! Single-wire sensors occasionally hand back garbage that still passes the
//! checksum (or drivers that report "no value" as NaN). These checks only
//! reject values that cannot exist physically. A very hot room is exactly what
//! the model should see, so nothing here narrows the range to "normal".

use crate::errors::{SensorError, SensorResult};

/// Nothing is colder than this
pub const ABSOLUTE_ZERO_C: f64 = -273.15;

/// Driest possible relative humidity, in percent
pub const HUMIDITY_MIN_PCT: f64 = 0.0;
/// Saturation, in percent
pub const HUMIDITY_MAX_PCT: f64 = 100.0;

/// Check a value is a real number inside `[min, max]`
pub fn check_range(channel: &'static str, value: f64, min: f64, max: f64) -> SensorResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(SensorError::Implausible { channel, value });
    }
    Ok(())
}

/// Check a temperature/humidity pair before it reaches the window
pub fn check_reading(temperature: f64, humidity: f64) -> SensorResult<()> {
    check_range("temperature", temperature, ABSOLUTE_ZERO_C, f64::MAX)?;
    check_range("humidity", humidity, HUMIDITY_MIN_PCT, HUMIDITY_MAX_PCT)
}
