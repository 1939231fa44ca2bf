//! Sensor readings and feature vectors
//!
//! A [`Reading`] is one acquisition: DHT temperature and humidity plus the PIR
//! motion level, stamped with local time. Only its three channels enter the
//! rolling window, as a [`Features`] triple; the window mean is a
//! [`FeatureVector`] in model order.

use crate::time::Timestamp;

/// Number of model features
pub const FEATURE_COUNT: usize = 3;

/// Feature names in model order, as they appear in the CSV logs
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["Temperature", "Humidity", "Motion"];

/// Raw per-reading features: (temperature °C, humidity %, motion 0|1)
pub type Features = (f64, f64, u8);

/// One acquisition from the sensors
///
/// Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// PIR motion line level
    pub motion: bool,
    /// Local time of acquisition
    pub timestamp: Timestamp,
}

impl Reading {
    /// Create a reading
    pub fn new(temperature: f64, humidity: f64, motion: bool, timestamp: Timestamp) -> Self {
        Self {
            temperature,
            humidity,
            motion,
            timestamp,
        }
    }

    /// Motion as the 0|1 value used in features and logs
    pub fn motion_level(&self) -> u8 {
        u8::from(self.motion)
    }

    /// The triple pushed into the rolling window
    pub fn features(&self) -> Features {
        (self.temperature, self.humidity, self.motion_level())
    }
}

/// Three-feature vector in model order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build from the three channels
    pub const fn new(temperature: f64, humidity: f64, motion: f64) -> Self {
        Self([temperature, humidity, motion])
    }

    /// All-zero vector
    pub const fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    /// Feature by index
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Values in feature order
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// `(temperature, humidity, motion)`
    pub fn to_tuple(&self) -> (f64, f64, f64) {
        (self.0[0], self.0[1], self.0[2])
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Sum of squared components
    pub fn norm_squared(&self) -> f64 {
        self.0.iter().map(|v| v * v).sum()
    }
}

impl From<(f64, f64, f64)> for FeatureVector {
    fn from((t, h, m): (f64, f64, f64)) -> Self {
        Self::new(t, h, m)
    }
}

impl From<Features> for FeatureVector {
    fn from((t, h, m): Features) -> Self {
        Self::new(t, h, f64::from(m))
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}
