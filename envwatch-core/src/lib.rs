//! Core detection loop for envwatch
//!
//! Turns a stream of (temperature, humidity, motion) readings into
//! inlier/outlier verdicts and drives alert outputs from them.
//!
//! Key constraints:
//! - Single logical thread, one tick at a time
//! - A failed sensor read never touches the rolling window
//! - A failed log write never stops monitoring or actuation
//! - Alert lines are released on drop
//!
//! ```no_run
//! use envwatch_core::window::RollingWindow;
//!
//! let mut window = RollingWindow::new(3)?;
//! window.push((20.0, 50.0, 0));
//! window.push((20.0, 50.0, 0));
//! assert!(window.mean().is_none()); // still warming up
//!
//! window.push((20.0, 50.0, 0));
//! let mean = window.mean().unwrap();
//! assert_eq!(mean.to_tuple(), (20.0, 50.0, 0.0));
//! # Ok::<(), envwatch_core::errors::WindowError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod actuator;
pub mod detector;
pub mod errors;
#[cfg(feature = "std")]
pub mod logfile;
pub mod reading;
#[cfg(feature = "std")]
pub mod recorder;
pub mod time;
pub mod traits;
pub mod validate;
pub mod verdict;
pub mod window;

// Public API
pub use actuator::{ActuatorController, ActuatorState, AlertConfig};
pub use detector::{Detector, DetectorPhase, DetectorStats, TickOutcome};
pub use errors::{ActuatorError, DetectorError, ScoreError, SensorError, SensorResult, WindowError};
#[cfg(feature = "std")]
pub use logfile::{AnomalyLog, LogError, SensorLog};
pub use reading::{FeatureVector, Features, Reading, FEATURE_COUNT, FEATURE_NAMES};
#[cfg(feature = "std")]
pub use recorder::{Recorder, RecorderStats};
pub use traits::{AlertLine, AnomalyScorer, AnomalySink, SensorSource};
pub use verdict::{Scored, Verdict, PREDICTION_INLIER, PREDICTION_OUTLIER};
pub use window::RollingWindow;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
