//! The detection loop, one tick at a time
//!
//! ## Phases
//!
//! ```text
//!  ┌─────────┐  window reaches W (once)  ┌────────┐
//!  │ Warming │ ────────────────────────▶ │ Active │
//!  └─────────┘                           └────────┘
//!   read, buffer                          read, buffer, score,
//!                                         actuate, log
//! ```
//!
//! ## Tick
//!
//! 1. Read the sensor and check the values are physically possible. On
//!    failure the tick is skipped and the window is not touched.
//! 2. Push the reading's features into the window.
//! 3. Warming: report progress and stop here.
//! 4. Active: score the window mean, apply the verdict to the alert outputs,
//!    record the latest reading with the verdict.
//!
//! Only a scoring error is fatal. Actuator and sink failures are counted in
//! [`DetectorStats`] and logged, and the tick still counts as scored.
//!
//! The detector never sleeps. Pacing and shutdown belong to whoever calls
//! [`Detector::tick`].

use crate::actuator::{ActuatorController, ActuatorState};
use crate::errors::{DetectorError, SensorError};
use crate::reading::Reading;
use crate::traits::{AlertLine, AnomalyScorer, AnomalySink, SensorSource};
use crate::validate::check_reading;
use crate::verdict::Scored;
use crate::window::RollingWindow;

/// Detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// Window not full yet
    Warming,
    /// Every successful read is scored
    Active,
}

/// Counters kept across ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorStats {
    /// Ticks attempted
    pub ticks: u64,
    /// Ticks skipped because the read failed
    pub skipped_reads: u64,
    /// Ticks that produced a verdict
    pub scored: u64,
    /// Scored ticks with an outlier verdict
    pub anomalies: u64,
    /// Sink records that failed
    pub log_failures: u64,
    /// Verdicts the alert outputs could not follow
    pub actuator_failures: u64,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Read failed; nothing else happened
    Skipped(SensorError),
    /// Reading buffered, window not full yet
    Warming {
        /// Readings in the window
        have: usize,
        /// Window capacity W
        need: usize,
    },
    /// Window mean scored
    Scored {
        /// Latest reading
        reading: Reading,
        /// Scorer output for the window mean
        scored: Scored,
        /// Actuator state after applying the verdict
        state: ActuatorState,
    },
}

/// Sensor, window, scorer, outputs and sink wired into one loop
pub struct Detector<S, C, B, L, K>
where
    S: SensorSource,
    C: AnomalyScorer,
    B: AlertLine,
    L: AlertLine,
    K: AnomalySink,
{
    sensor: S,
    window: RollingWindow,
    scorer: C,
    actuators: ActuatorController<B, L>,
    sink: K,
    phase: DetectorPhase,
    stats: DetectorStats,
}

impl<S, C, B, L, K> Detector<S, C, B, L, K>
where
    S: SensorSource,
    C: AnomalyScorer,
    B: AlertLine,
    L: AlertLine,
    K: AnomalySink,
{
    /// Assemble a detector; it starts in [`DetectorPhase::Warming`]
    pub fn new(
        sensor: S,
        window: RollingWindow,
        scorer: C,
        actuators: ActuatorController<B, L>,
        sink: K,
    ) -> Self {
        Self {
            sensor,
            window,
            scorer,
            actuators,
            sink,
            phase: DetectorPhase::Warming,
            stats: DetectorStats::default(),
        }
    }

    /// Run one tick
    ///
    /// Returns `Err` only when scoring fails; the caller should stop then.
    pub fn tick(&mut self) -> Result<TickOutcome, DetectorError> {
        self.stats.ticks += 1;

        let checked = self
            .sensor
            .read()
            .and_then(|r| check_reading(r.temperature, r.humidity).map(|()| r));
        let reading = match checked {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.skipped_reads += 1;
                log::warn!("{} read failed, skipping tick: {}", self.sensor.name(), e);
                return Ok(TickOutcome::Skipped(e));
            }
        };

        self.window.push(reading.features());

        let mean = match self.window.mean() {
            Some(mean) => mean,
            None => {
                let (have, need) = (self.window.len(), self.window.capacity());
                log::info!("waiting for enough data ({}/{})", have, need);
                return Ok(TickOutcome::Warming { have, need });
            }
        };

        if self.phase == DetectorPhase::Warming {
            self.phase = DetectorPhase::Active;
            log::info!("window full with {} readings, scoring started", self.window.capacity());
        }

        let scored = self.scorer.score(&mean)?;
        self.stats.scored += 1;
        if scored.verdict.is_outlier() {
            self.stats.anomalies += 1;
        }

        if let Err(e) = self.actuators.apply(scored.verdict) {
            self.stats.actuator_failures += 1;
            log::error!("{}", e);
        }

        if let Err(e) = self.sink.record(&reading, scored.verdict) {
            self.stats.log_failures += 1;
            log::warn!("failed to record tick: {}", e);
        }

        let status = if scored.verdict.is_outlier() { "ANOMALY DETECTED" } else { "normal" };
        log::info!(
            "temp {:.1}C humidity {:.1}% motion {} -> {}",
            reading.temperature,
            reading.humidity,
            reading.motion_level(),
            status
        );

        Ok(TickOutcome::Scored {
            reading,
            scored,
            state: self.actuators.state(),
        })
    }

    /// De-assert the alert outputs now instead of at drop
    pub fn release(&mut self) {
        if let Err(e) = self.actuators.release() {
            log::error!("failed to release alert outputs: {}", e);
        }
    }

    /// Warming up or scoring
    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Counters since construction
    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    /// Readings currently in the window
    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Borrow the scorer
    pub fn scorer(&self) -> &C {
        &self.scorer
    }

    /// Borrow the alert outputs
    pub fn actuators(&self) -> &ActuatorController<B, L> {
        &self.actuators
    }

    /// Borrow the verdict sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Borrow the sensor
    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}
