//! Shared fakes for the detector integration tests
//!
//! - [`ScriptedSensor`]: replays a fixed list of read results
//! - [`SharedLine`]: alert line whose level stays observable after the
//!   controller that owns it is dropped
//! - [`BoundaryScorer`]: standardizes with a given mean/scale and flags
//!   anything farther than `radius` from the origin
//! - [`VecSink`]: keeps recorded verdicts in memory

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use envwatch_core::{
    time::{FixedTime, TimeSource},
    ActuatorError, AlertLine, AnomalyScorer, AnomalySink, FeatureVector, Reading, ScoreError,
    Scored, SensorError, SensorResult, SensorSource, Verdict,
};

/// Replays scripted reads, one second apart
pub struct ScriptedSensor {
    script: VecDeque<SensorResult<(f64, f64, bool)>>,
    clock: FixedTime,
}

impl ScriptedSensor {
    pub fn new(script: Vec<SensorResult<(f64, f64, bool)>>) -> Self {
        Self {
            script: script.into(),
            clock: FixedTime::epoch(),
        }
    }

    /// Only successful reads
    pub fn readings(values: &[(f64, f64, bool)]) -> Self {
        Self::new(values.iter().copied().map(Ok).collect())
    }
}

impl SensorSource for ScriptedSensor {
    fn read(&mut self) -> SensorResult<Reading> {
        let next = self.script.pop_front().unwrap_or(Err(SensorError::Timeout { waited_us: 0 }));
        let now = self.clock.now();
        self.clock.advance(1);
        let (temperature, humidity, motion) = next?;
        Ok(Reading::new(temperature, humidity, motion, now))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Line level shared with the test body
#[derive(Clone, Default)]
pub struct SharedLine {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl SharedLine {
    pub fn level(&self) -> bool {
        self.level.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl AlertLine for SharedLine {
    fn set_level(&mut self, asserted: bool) -> Result<(), ActuatorError> {
        self.writes.set(self.writes.get() + 1);
        self.level.set(asserted);
        Ok(())
    }

    fn is_asserted(&self) -> bool {
        self.level.get()
    }

    fn label(&self) -> &'static str {
        "shared"
    }
}

/// Scorer with a known decision boundary
pub struct BoundaryScorer {
    pub mean: [f64; 3],
    pub scale: [f64; 3],
    pub radius: f64,
}

impl AnomalyScorer for BoundaryScorer {
    fn score(&self, mean: &FeatureVector) -> Result<Scored, ScoreError> {
        let mut z = [0.0; 3];
        for (i, value) in mean.as_array().iter().enumerate() {
            if self.scale[i] == 0.0 {
                return Err(ScoreError::DegenerateScale { feature: i, scale: self.scale[i] });
            }
            z[i] = (value - self.mean[i]) / self.scale[i];
        }
        let standardized = FeatureVector(z);
        let distance = standardized.norm_squared().sqrt();
        let verdict = if distance > self.radius { Verdict::Outlier } else { Verdict::Inlier };
        Ok(Scored {
            verdict,
            score: Some(distance),
            standardized,
        })
    }
}

/// Scaler centered on (20, 50, 0) with unit scale, boundary at distance 3
pub fn room_scorer() -> BoundaryScorer {
    BoundaryScorer {
        mean: [20.0, 50.0, 0.0],
        scale: [1.0, 1.0, 1.0],
        radius: 3.0,
    }
}

/// In-memory sink
#[derive(Default)]
pub struct VecSink {
    pub rows: Vec<(Reading, Verdict)>,
}

impl AnomalySink for VecSink {
    type Error = std::convert::Infallible;

    fn record(&mut self, reading: &Reading, verdict: Verdict) -> Result<(), Self::Error> {
        self.rows.push((*reading, verdict));
        Ok(())
    }
}
