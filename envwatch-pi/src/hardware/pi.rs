//! GPIO-backed sensor and alert lines (rppal)

use std::thread;
use std::time::{Duration, Instant};

use envwatch_core::errors::{ActuatorError, SensorError, SensorResult};
use envwatch_core::time::{LocalClock, TimeSource};
use envwatch_core::validate::check_reading;
use envwatch_core::{AlertLine, Reading, SensorSource};
use rppal::gpio::{Bias, Gpio, InputPin, IoPin, Level, Mode, OutputPin};

use super::dht11::{self, PulseBuffer, FRAME_BITS, MIN_READ_INTERVAL_MS};
use crate::config::GpioConfig;

/// Host start signal: hold the line low at least 18ms
const START_LOW_MS: u64 = 20;
/// Sensor response (80us low + 80us high) plus slack
const RESPONSE_TIMEOUT_US: u32 = 200;
/// Longest single level inside a bit
const BIT_TIMEOUT_US: u32 = 120;

#[derive(thiserror::Error, Debug)]
pub enum HardwareError {
    #[error("failed to access GPIO: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// DHT11 on one bidirectional pin
///
/// Reads closer together than the sensor allows return the last good values,
/// the way the sensor's own vendor libraries behave.
pub struct Dht11 {
    pin: IoPin,
    last: Option<(Instant, (f64, f64))>,
}

impl Dht11 {
    pub fn new(gpio: &Gpio, bcm: u8) -> Result<Self, HardwareError> {
        let mut pin = gpio.get(bcm)?.into_io(Mode::Input);
        pin.set_bias(Bias::PullUp);
        Ok(Self { pin, last: None })
    }

    /// (temperature °C, humidity %)
    pub fn read(&mut self) -> SensorResult<(f64, f64)> {
        if let Some((at, values)) = self.last {
            if at.elapsed() < Duration::from_millis(MIN_READ_INTERVAL_MS) {
                return Ok(values);
            }
        }

        let values = dht11::decode(self.read_frame()?)?;
        self.last = Some((Instant::now(), values));
        Ok(values)
    }

    fn read_frame(&mut self) -> SensorResult<[u8; 5]> {
        self.pin.set_mode(Mode::Output);
        self.pin.set_low();
        thread::sleep(Duration::from_millis(START_LOW_MS));
        self.pin.set_mode(Mode::Input);

        // Response: sensor pulls low, then high, then low into the first bit
        self.wait_for(Level::Low, RESPONSE_TIMEOUT_US)?;
        self.wait_for(Level::High, RESPONSE_TIMEOUT_US)?;
        self.wait_for(Level::Low, RESPONSE_TIMEOUT_US)?;

        let mut pulses = PulseBuffer::new();
        for _ in 0..FRAME_BITS {
            self.wait_for(Level::High, BIT_TIMEOUT_US)?;
            let high_us = self.wait_for(Level::Low, BIT_TIMEOUT_US)?;
            dht11::push_pulse(&mut pulses, high_us)?;
        }

        dht11::bits_from_pulses(&pulses)
    }

    /// Busy-wait until the line reads `level`; returns the time waited
    fn wait_for(&self, level: Level, timeout_us: u32) -> SensorResult<u32> {
        let start = Instant::now();
        loop {
            let waited_us = u32::try_from(start.elapsed().as_micros()).unwrap_or(u32::MAX);
            if self.pin.read() == level {
                return Ok(waited_us);
            }
            if waited_us > timeout_us {
                return Err(SensorError::Timeout { waited_us });
            }
        }
    }
}

/// DHT11 plus PIR, stamped with local time
pub struct PiSensor {
    dht: Dht11,
    pir: InputPin,
    clock: LocalClock,
    last_motion: Option<bool>,
}

impl PiSensor {
    pub fn new(gpio: &Gpio, config: &GpioConfig) -> Result<Self, HardwareError> {
        Ok(Self {
            dht: Dht11::new(gpio, config.dht_pin)?,
            pir: gpio.get(config.pir_pin)?.into_input(),
            clock: LocalClock,
            last_motion: None,
        })
    }

    /// Claim only the sensor pins
    pub fn open(config: &GpioConfig) -> Result<Self, HardwareError> {
        Self::new(&Gpio::new()?, config)
    }
}

impl SensorSource for PiSensor {
    fn read(&mut self) -> SensorResult<Reading> {
        let motion = self.pir.is_high();
        self.last_motion = Some(motion);

        let (temperature, humidity) = self.dht.read()?;
        check_reading(temperature, humidity)?;
        Ok(Reading::new(temperature, humidity, motion, self.clock.now()))
    }

    fn last_motion(&self) -> Option<bool> {
        self.last_motion
    }

    fn name(&self) -> &'static str {
        "DHT11"
    }
}

/// Active-high output pin
pub struct GpioLine {
    pin: OutputPin,
    label: &'static str,
    asserted: bool,
}

impl GpioLine {
    /// Claim the pin and drive it low
    pub fn new(gpio: &Gpio, bcm: u8, label: &'static str) -> Result<Self, HardwareError> {
        Ok(Self {
            pin: gpio.get(bcm)?.into_output_low(),
            label,
            asserted: false,
        })
    }
}

impl AlertLine for GpioLine {
    fn set_level(&mut self, asserted: bool) -> Result<(), ActuatorError> {
        if asserted {
            self.pin.set_high();
        } else {
            self.pin.set_low();
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

/// All pins from the configuration, claimed at once
pub struct PiHardware {
    pub sensor: PiSensor,
    pub buzzer: GpioLine,
    pub led: GpioLine,
}

impl PiHardware {
    pub fn open(config: &GpioConfig) -> Result<Self, HardwareError> {
        let gpio = Gpio::new()?;
        let hardware = Self {
            sensor: PiSensor::new(&gpio, config)?,
            buzzer: GpioLine::new(&gpio, config.buzzer_pin, "buzzer")?,
            led: GpioLine::new(&gpio, config.led_pin, "led")?,
        };
        log::info!(
            "GPIO ready: DHT11 on {}, PIR on {}, buzzer on {}, LED on {}",
            config.dht_pin,
            config.pir_pin,
            config.buzzer_pin,
            config.led_pin
        );
        Ok(hardware)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::dht11::ONE_THRESHOLD_US;

    #[test]
    fn bit_timeout_covers_a_one() {
        // A 1 is a ~70us high; the wait must outlast it and the 0/1 threshold
        assert!(BIT_TIMEOUT_US > 70);
        assert!(BIT_TIMEOUT_US > ONE_THRESHOLD_US);
        assert!(RESPONSE_TIMEOUT_US >= 160);
    }

    #[test]
    fn start_pulse_is_long_enough() {
        assert!(START_LOW_MS >= 18);
    }
}
