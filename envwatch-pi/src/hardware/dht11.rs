//! DHT11 frame decoding
//!
//! The sensor answers a start pulse with 40 bits, MSB first. Every bit is a
//! ~50us low followed by a high whose length carries the value:
//!
//! ```text
//!        ┌──┐                 ┌────────┐
//!  0:  ──┘  └──   26-28us     1:  ──┘        └──   ~70us
//! ```
//!
//! The 5 bytes are `humidity int, humidity dec, temperature int,
//! temperature dec, checksum`, where the checksum is the low byte of the sum
//! of the first four. Bit 7 of the temperature decimal byte marks a negative
//! temperature.
//!
//! Nothing here touches GPIO, so the whole path from pulse lengths to
//! values is tested on any machine.

use envwatch_core::errors::{SensorError, SensorResult};
use heapless::Vec;

/// Bits in one frame
pub const FRAME_BITS: usize = 40;

/// High pulses at least this long are a 1
pub const ONE_THRESHOLD_US: u32 = 50;

/// The sensor needs this long between conversions
pub const MIN_READ_INTERVAL_MS: u64 = 2_000;

/// High pulse lengths of one frame, in microseconds
pub type PulseBuffer = Vec<u32, FRAME_BITS>;

/// Record one high pulse
pub fn push_pulse(pulses: &mut PulseBuffer, high_us: u32) -> SensorResult<()> {
    pulses
        .push(high_us)
        .map_err(|_| SensorError::Bus { reason: "more than 40 bits in DHT11 frame" })
}

/// Pack 40 pulse lengths into the 5 frame bytes
pub fn bits_from_pulses(pulses: &[u32]) -> SensorResult<[u8; 5]> {
    if pulses.len() != FRAME_BITS {
        return Err(SensorError::Bus { reason: "incomplete DHT11 frame" });
    }

    let mut frame = [0u8; 5];
    for (i, &high_us) in pulses.iter().enumerate() {
        if high_us >= ONE_THRESHOLD_US {
            frame[i / 8] |= 0x80 >> (i % 8);
        }
    }
    Ok(frame)
}

/// Verify the checksum and convert to (temperature °C, humidity %)
pub fn decode(frame: [u8; 5]) -> SensorResult<(f64, f64)> {
    let expected = frame[..4].iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
    if expected != frame[4] {
        return Err(SensorError::Checksum {
            expected,
            actual: frame[4],
        });
    }

    let humidity = tenths(frame[0], frame[1]);
    let magnitude = tenths(frame[2], frame[3] & 0x7f);
    let temperature = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };

    Ok((temperature, humidity))
}

/// `int.dec` from the two frame bytes, rounded like the printed value
fn tenths(int: u8, dec: u8) -> f64 {
    f64::from(u16::from(int) * 10 + u16::from(dec)) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pulse lengths the sensor would send for `frame`
    fn pulses_for(frame: [u8; 5]) -> PulseBuffer {
        let mut pulses = PulseBuffer::new();
        for byte in frame {
            for bit in 0..8 {
                let high = if byte & (0x80 >> bit) != 0 { 70 } else { 27 };
                push_pulse(&mut pulses, high).unwrap();
            }
        }
        pulses
    }

    #[test]
    fn decodes_room_conditions() {
        // 45% RH, 22.0 °C
        let frame = [45, 0, 22, 0, 67];
        let (t, h) = decode(bits_from_pulses(&pulses_for(frame)).unwrap()).unwrap();
        assert_eq!(t, 22.0);
        assert_eq!(h, 45.0);
    }

    #[test]
    fn decimal_and_negative_temperature() {
        let (t, _) = decode([30, 0, 3, 0x85, 30u8.wrapping_add(3).wrapping_add(0x85)]).unwrap();
        assert!((t + 3.5).abs() < 1e-9);

        let (t, h) = decode([50, 5, 21, 3, 79]).unwrap();
        assert!((t - 21.3).abs() < 1e-9);
        assert!((h - 50.5).abs() < 1e-9);
    }

    #[test]
    fn decimals_print_as_the_sensor_sent_them() {
        let (t, h) = decode([41, 7, 22, 3, 73]).unwrap();
        assert_eq!(t, 22.3);
        assert_eq!(h, 41.7);
        assert_eq!(format!("{:?},{}", t, h), "22.3,41.7");
    }

    #[test]
    fn checksum_mismatch_reported() {
        assert_eq!(
            decode([45, 0, 22, 0, 68]),
            Err(SensorError::Checksum { expected: 67, actual: 68 })
        );
    }

    #[test]
    fn checksum_wraps() {
        let frame = [200, 0, 100, 0, 44];
        assert!(decode(frame).is_ok());
    }

    #[test]
    fn short_frame_is_bus_error() {
        let pulses = [27u32; 39];
        assert!(matches!(bits_from_pulses(&pulses), Err(SensorError::Bus { .. })));
    }

    #[test]
    fn overlong_frame_refused() {
        let mut pulses = pulses_for([0; 5]);
        assert!(push_pulse(&mut pulses, 27).is_err());
        assert_eq!(pulses.len(), FRAME_BITS);
    }
}
