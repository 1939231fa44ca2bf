//! Sensor and alert hardware
//!
//! [`dht11`] is plain decoding and always built. The GPIO side needs the
//! `raspberry-pi` feature and a Pi to run on.

pub mod dht11;

#[cfg(feature = "raspberry-pi")]
mod pi;

#[cfg(feature = "raspberry-pi")]
pub use pi::{Dht11, GpioLine, HardwareError, PiHardware, PiSensor};
