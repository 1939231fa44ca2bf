//! envwatch on a Raspberry Pi
//!
//! Everything between the detection loop in `envwatch-core` and the board:
//!
//! - [`config`]: the JSON configuration file
//! - [`hardware`]: DHT11 frame decoding, and with the `raspberry-pi` feature
//!   the GPIO-backed sensor and alert lines
//! - [`sim`]: a seeded sensor and console alert lines for running without a board
//! - [`cli`]: the `envwatch` command line (`detect`, `record`, `train`)
//!
//! Without the `raspberry-pi` feature the binary still builds anywhere and
//! runs with `--simulate`.

pub mod cli;
pub mod config;
pub mod hardware;
pub mod sim;

pub use config::{Config, ConfigError};
pub use sim::{ConsoleLine, SimProfile, SimulatedSensor};
