//! Running without a board
//!
//! [`SimulatedSensor`] produces a quiet room with occasional motion, the odd
//! checksum failure a real DHT11 gives, and rare hot/dry spikes that last a
//! few ticks so the rolling mean actually moves. [`ConsoleLine`] stands in for
//! a GPIO output and logs its level changes.

use envwatch_core::errors::{ActuatorError, SensorError, SensorResult};
use envwatch_core::time::{LocalClock, TimeSource};
use envwatch_core::validate::check_reading;
use envwatch_core::{AlertLine, Reading, SensorSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shape of the simulated room
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimProfile {
    pub base_temperature: f64,
    /// Uniform noise half-width, °C
    pub temperature_noise: f64,
    pub base_humidity: f64,
    /// Uniform noise half-width, %
    pub humidity_noise: f64,
    /// Chance the PIR line is high on a tick
    pub motion_probability: f64,
    /// Chance a read fails with a checksum error
    pub fault_probability: f64,
    /// Chance a spike starts on a tick
    pub spike_probability: f64,
    /// Ticks a spike lasts
    pub spike_ticks: u32,
    /// Added to temperature during a spike
    pub spike_temperature: f64,
    /// Added to humidity during a spike
    pub spike_humidity: f64,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            base_temperature: 22.0,
            temperature_noise: 0.5,
            base_humidity: 45.0,
            humidity_noise: 2.0,
            motion_probability: 0.05,
            fault_probability: 0.05,
            spike_probability: 0.02,
            spike_ticks: 6,
            spike_temperature: 12.0,
            spike_humidity: -25.0,
        }
    }
}

/// Seeded stand-in for the DHT11 and PIR
pub struct SimulatedSensor<T: TimeSource = LocalClock> {
    rng: StdRng,
    profile: SimProfile,
    clock: T,
    spike_left: u32,
    last_motion: Option<bool>,
}

impl SimulatedSensor<LocalClock> {
    pub fn new(seed: u64) -> Self {
        Self::with_clock(seed, SimProfile::default(), LocalClock)
    }
}

impl<T: TimeSource> SimulatedSensor<T> {
    pub fn with_clock(seed: u64, profile: SimProfile, clock: T) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            profile,
            clock,
            spike_left: 0,
            last_motion: None,
        }
    }

    pub fn profile(&self) -> &SimProfile {
        &self.profile
    }

    /// True while a spike is running
    pub fn in_spike(&self) -> bool {
        self.spike_left > 0
    }

    fn noise(&mut self, half_width: f64) -> f64 {
        if half_width > 0.0 {
            self.rng.gen_range(-half_width..half_width)
        } else {
            0.0
        }
    }
}

impl<T: TimeSource> SensorSource for SimulatedSensor<T> {
    fn read(&mut self) -> SensorResult<Reading> {
        let p = self.profile;

        let motion = self.rng.gen_bool(p.motion_probability);
        self.last_motion = Some(motion);

        if self.rng.gen_bool(p.fault_probability) {
            let actual: u8 = self.rng.gen();
            return Err(SensorError::Checksum {
                expected: actual.wrapping_add(1),
                actual,
            });
        }

        if self.spike_left == 0 && self.rng.gen_bool(p.spike_probability) {
            self.spike_left = p.spike_ticks;
            log::debug!("simulated spike for {} ticks", p.spike_ticks);
        }

        let mut temperature = p.base_temperature + self.noise(p.temperature_noise);
        let mut humidity = p.base_humidity + self.noise(p.humidity_noise);
        if self.spike_left > 0 {
            self.spike_left -= 1;
            temperature += p.spike_temperature;
            humidity += p.spike_humidity;
        }

        // Same one-decimal resolution as the real sensor
        let temperature = (temperature * 10.0).round() / 10.0;
        let humidity = ((humidity * 10.0).round() / 10.0).clamp(0.0, 100.0);

        check_reading(temperature, humidity)?;
        Ok(Reading::new(temperature, humidity, motion, self.clock.now()))
    }

    fn last_motion(&self) -> Option<bool> {
        self.last_motion
    }

    fn name(&self) -> &'static str {
        "simulated sensor"
    }
}

/// Alert output that only logs
#[derive(Debug)]
pub struct ConsoleLine {
    label: &'static str,
    asserted: bool,
}

impl ConsoleLine {
    pub fn new(label: &'static str) -> Self {
        Self { label, asserted: false }
    }
}

impl AlertLine for ConsoleLine {
    fn set_level(&mut self, asserted: bool) -> Result<(), ActuatorError> {
        if asserted != self.asserted {
            log::info!("{} {}", self.label, if asserted { "ON" } else { "off" });
        }
        self.asserted = asserted;
        Ok(())
    }

    fn is_asserted(&self) -> bool {
        self.asserted
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envwatch_core::time::FixedTime;

    fn quiet_profile() -> SimProfile {
        SimProfile {
            motion_probability: 0.0,
            fault_probability: 0.0,
            spike_probability: 0.0,
            ..SimProfile::default()
        }
    }

    #[test]
    fn same_seed_same_readings() {
        let mut a = SimulatedSensor::with_clock(9, SimProfile::default(), FixedTime::epoch());
        let mut b = SimulatedSensor::with_clock(9, SimProfile::default(), FixedTime::epoch());
        for _ in 0..50 {
            assert_eq!(a.read(), b.read());
        }
    }

    #[test]
    fn quiet_room_stays_near_base() {
        let mut sensor = SimulatedSensor::with_clock(1, quiet_profile(), FixedTime::epoch());
        for _ in 0..200 {
            let reading = sensor.read().unwrap();
            assert!((reading.temperature - 22.0).abs() <= 0.55);
            assert!((reading.humidity - 45.0).abs() <= 2.05);
            assert!(!reading.motion);
        }
        assert_eq!(sensor.last_motion(), Some(false));
    }

    #[test]
    fn spike_lasts_configured_ticks() {
        let profile = SimProfile {
            spike_probability: 1.0,
            spike_ticks: 3,
            temperature_noise: 0.0,
            humidity_noise: 0.0,
            ..quiet_profile()
        };
        let mut sensor = SimulatedSensor::with_clock(2, profile, FixedTime::epoch());

        let reading = sensor.read().unwrap();
        assert_eq!(reading.temperature, 34.0);
        assert_eq!(reading.humidity, 20.0);
        assert!(sensor.in_spike());
    }

    #[test]
    fn faults_still_sample_motion() {
        let profile = SimProfile {
            fault_probability: 1.0,
            motion_probability: 1.0,
            ..SimProfile::default()
        };
        let mut sensor = SimulatedSensor::with_clock(3, profile, FixedTime::epoch());

        assert!(matches!(sensor.read(), Err(SensorError::Checksum { .. })));
        assert_eq!(sensor.last_motion(), Some(true));
    }

    #[test]
    fn console_line_tracks_level() {
        let mut line = ConsoleLine::new("led");
        line.set_level(true).unwrap();
        assert!(line.is_asserted());
        line.set_level(false).unwrap();
        assert!(!line.is_asserted());
        assert_eq!(line.label(), "led");
    }
}
