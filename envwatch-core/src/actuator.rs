//! Alert output state machine
//!
//! Two states, recomputed from scratch on every scored tick:
//!
//! ```text
//!            Outlier                 Inlier
//!   ┌──────────────────────┐  ┌──────────────────────┐
//!   ▼                      │  ▼                      │
//! ALERT ── Inlier ──▶ NORMAL ── Outlier ──▶ ALERT ───┘
//!   │                                           ▲
//!   └──────────────── Outlier ──────────────────┘
//! ```
//!
//! - Outlier asserts each *configured* output; outputs whose flag is off are
//!   not touched at all.
//! - Inlier de-asserts both outputs, configured or not, every time.
//! - No debouncing, no dwell time, no memory of earlier verdicts.
//!
//! Dropping the controller de-asserts both lines, so leaving the loop by any
//! path (interrupt, fatal error, panic unwind) leaves the hardware quiet.

use crate::errors::ActuatorError;
use crate::traits::AlertLine;
use crate::verdict::Verdict;

/// Which outputs an outlier asserts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertConfig {
    /// Sound the buzzer on anomalies
    pub use_buzzer: bool,
    /// Light the LED on anomalies
    pub use_led: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            use_buzzer: true,
            use_led: true,
        }
    }
}

/// Logical actuator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    /// Last scored tick was an inlier (or nothing scored yet)
    Normal,
    /// Last scored tick was an outlier
    Alert,
}

/// Drives the buzzer and LED from verdicts
pub struct ActuatorController<B: AlertLine, L: AlertLine> {
    buzzer: B,
    led: L,
    config: AlertConfig,
    state: ActuatorState,
}

impl<B: AlertLine, L: AlertLine> ActuatorController<B, L> {
    /// Take ownership of both lines
    pub fn new(buzzer: B, led: L, config: AlertConfig) -> Self {
        Self {
            buzzer,
            led,
            config,
            state: ActuatorState::Normal,
        }
    }

    /// Apply a verdict to the outputs
    ///
    /// Both lines are always attempted; the first failure is returned.
    pub fn apply(&mut self, verdict: Verdict) -> Result<ActuatorState, ActuatorError> {
        let (buzzer, led) = match verdict {
            Verdict::Outlier => {
                self.state = ActuatorState::Alert;
                let buzzer = if self.config.use_buzzer { self.buzzer.set_level(true) } else { Ok(()) };
                let led = if self.config.use_led { self.led.set_level(true) } else { Ok(()) };
                (buzzer, led)
            }
            Verdict::Inlier => {
                self.state = ActuatorState::Normal;
                (self.buzzer.set_level(false), self.led.set_level(false))
            }
        };

        buzzer.and(led)?;
        Ok(self.state)
    }

    /// De-assert both outputs
    pub fn release(&mut self) -> Result<(), ActuatorError> {
        self.state = ActuatorState::Normal;
        let buzzer = self.buzzer.set_level(false);
        let led = self.led.set_level(false);
        buzzer.and(led)
    }

    /// Current alert state
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Timing this controller was built with
    pub fn config(&self) -> AlertConfig {
        self.config
    }

    /// Borrow the buzzer line
    pub fn buzzer(&self) -> &B {
        &self.buzzer
    }

    /// Borrow the LED line
    pub fn led(&self) -> &L {
        &self.led
    }
}

impl<B: AlertLine, L: AlertLine> Drop for ActuatorController<B, L> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::error!("failed to release alert outputs on shutdown: {}", e);
        }
    }
}
