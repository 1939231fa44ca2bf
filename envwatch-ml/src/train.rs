//! Offline training from a recorded sensor log
//!
//! ```text
//! sensor_log.csv ──▶ drop incomplete rows ──▶ rolling mean (W)
//!        ──▶ fit scaler ──▶ standardize ──▶ fit forest ──▶ ModelArtifact
//! ```
//!
//! The rolling mean runs over consecutive *surviving* rows, the same way the
//! detector's window only ever sees successful reads.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use envwatch_core::{FeatureVector, Features, RollingWindow, ScoreError, WindowError};
use thiserror_no_std::Error;

use crate::{ForestConfig, IsolationForest, MLError, ModelArtifact, ModelKind, StandardScaler};

/// Why training stopped
#[derive(Error, Debug)]
pub enum TrainError {
    /// Sensor log could not be read
    #[error("failed to read sensor log {path}: {source}")]
    Io {
        /// Log path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Header lacks a required column
    #[error("sensor log has no {column} column")]
    MissingColumn {
        /// Column name
        column: &'static str,
    },

    /// Fewer complete rows than one window
    #[error("not enough complete rows to train: have {have}, need at least {need}")]
    NotEnoughRows {
        /// Complete rows found
        have: usize,
        /// Rolling window size
        need: usize,
    },

    /// Rolling window size is zero
    #[error(transparent)]
    Window(WindowError),

    /// Standardization failed
    #[error("standardization failed: {0}")]
    Scale(ScoreError),

    /// Model fitting failed
    #[error("model fitting failed: {0}")]
    Model(MLError),
}

/// Training parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Rolling window W, same as the detector's
    pub rolling_window: usize,
    /// Forest parameters, contamination included
    pub forest: ForestConfig,
}

/// Rows parsed from a sensor log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingData {
    /// Complete rows in file order
    pub rows: Vec<Features>,
    /// Rows dropped for missing or unparseable values
    pub dropped: usize,
}

impl TrainingData {
    /// Parse a sensor log; columns are found by header name
    pub fn from_reader(reader: impl BufRead) -> Result<Self, TrainError> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line.map_err(|source| read_error("<header>", source))?,
            None => return Ok(Self::default()),
        };
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |column: &'static str| {
            columns
                .iter()
                .position(|c| *c == column)
                .ok_or(TrainError::MissingColumn { column })
        };
        let (t_col, h_col, m_col) = (find("Temperature")?, find("Humidity")?, find("Motion")?);

        let mut data = Self::default();
        for line in lines {
            let line = line.map_err(|source| read_error("<row>", source))?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let parsed = (
                fields.get(t_col).and_then(|f| parse_value(f)),
                fields.get(h_col).and_then(|f| parse_value(f)),
                fields.get(m_col).and_then(|f| parse_motion(f)),
            );

            match parsed {
                (Some(t), Some(h), Some(m)) => data.rows.push((t, h, m)),
                _ => data.dropped += 1,
            }
        }

        Ok(data)
    }

    /// Parse the sensor log at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrainError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| read_error(&path.display().to_string(), source))?;
        Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            TrainError::Io { source, .. } => read_error(&path.display().to_string(), source),
            other => other,
        })
    }
}

fn read_error(path: &str, source: io::Error) -> TrainError {
    TrainError::Io {
        path: path.to_string(),
        source,
    }
}

/// Finite number; empty fields and `None` are missing
fn parse_value(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 0/1 level, also accepting `True`/`False`
fn parse_motion(field: &str) -> Option<u8> {
    match field {
        "0" | "False" | "false" => Some(0),
        "1" | "True" | "true" => Some(1),
        _ => None,
    }
}

/// Rolling means over `rows`; the first W-1 rows produce nothing
pub fn rolling_means(rows: &[Features], window: usize) -> Result<Vec<FeatureVector>, TrainError> {
    let mut rolling = RollingWindow::new(window).map_err(TrainError::Window)?;
    let mut means = Vec::with_capacity(rows.len().saturating_sub(window - 1));

    for row in rows {
        rolling.push(*row);
        if let Some(mean) = rolling.mean() {
            means.push(mean);
        }
    }
    Ok(means)
}

/// Fit scaler and forest on complete rows
pub fn train(rows: &[Features], config: &TrainConfig) -> Result<ModelArtifact, TrainError> {
    if config.rolling_window == 0 {
        return Err(TrainError::Window(WindowError::ZeroCapacity));
    }
    if rows.len() < config.rolling_window {
        return Err(TrainError::NotEnoughRows {
            have: rows.len(),
            need: config.rolling_window,
        });
    }

    let means = rolling_means(rows, config.rolling_window)?;
    let scaler = StandardScaler::fit(&means).map_err(TrainError::Model)?;
    let standardized = means
        .iter()
        .map(|m| scaler.transform(m))
        .collect::<Result<Vec<_>, _>>()
        .map_err(TrainError::Scale)?;

    let forest = IsolationForest::fit(&standardized, &config.forest).map_err(TrainError::Model)?;
    log::info!(
        "trained on {} rolling-mean vectors, threshold {:.4}",
        standardized.len(),
        forest.threshold()
    );

    Ok(ModelArtifact::new(
        scaler,
        ModelKind::IsolationForest(forest),
        config.rolling_window,
        config.forest.contamination,
        standardized.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Timestamp,Temperature,Humidity,Motion
2024-01-01 00:00:00,20.0,50,0
2024-01-01 00:00:02,,,1
2024-01-01 00:00:04,21.0,51,1
2024-01-01 00:00:06,None,None,0
2024-01-01 00:00:08,22.0,52,0
";

    #[test]
    fn incomplete_rows_dropped() {
        let data = TrainingData::from_reader(LOG.as_bytes()).unwrap();
        assert_eq!(data.rows, vec![(20.0, 50.0, 0), (21.0, 51.0, 1), (22.0, 52.0, 0)]);
        assert_eq!(data.dropped, 2);
    }

    #[test]
    fn columns_found_by_name() {
        let log = "Motion,Humidity,Temperature\n1,40,18.5\n";
        let data = TrainingData::from_reader(log.as_bytes()).unwrap();
        assert_eq!(data.rows, vec![(18.5, 40.0, 1)]);
    }

    #[test]
    fn missing_column_reported() {
        let log = "Timestamp,Temperature,Humidity\n";
        assert!(matches!(
            TrainingData::from_reader(log.as_bytes()),
            Err(TrainError::MissingColumn { column: "Motion" })
        ));
    }

    #[test]
    fn rolling_means_skip_first_w_minus_one() {
        let rows = [(20.0, 50.0, 0), (22.0, 52.0, 1), (24.0, 54.0, 1)];
        let means = rolling_means(&rows, 2).unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0], FeatureVector::new(21.0, 51.0, 0.5));
        assert_eq!(means[1], FeatureVector::new(23.0, 53.0, 1.0));
    }

    #[test]
    fn too_few_rows() {
        let config = TrainConfig { rolling_window: 5, forest: ForestConfig::default() };
        assert!(matches!(
            train(&[(20.0, 50.0, 0); 4], &config),
            Err(TrainError::NotEnoughRows { have: 4, need: 5 })
        ));
    }
}
