//! Sensor log -> trained artifact on disk -> scorer, the way `envwatch train`
//! and `envwatch detect` use it

use std::fmt::Write as _;
use std::fs;

use envwatch_core::{AnomalyScorer, FeatureVector, Verdict, PREDICTION_OUTLIER};
use envwatch_ml::{
    train, ArtifactError, ForestConfig, ModelArtifact, ModelKind, TrainConfig, TrainingData,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A quiet room: 22C +-0.5, 45% +-2, motion now and then, plus a few failed reads
fn quiet_room_log(rows: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    let mut log = String::from("Timestamp,Temperature,Humidity,Motion\n");

    for i in 0..rows {
        let ts = format!("2024-01-01 {:02}:{:02}:{:02}", i / 3600 % 24, i / 60 % 60, i % 60);
        if i % 97 == 0 {
            writeln!(log, "{},,,0", ts).unwrap();
            continue;
        }
        let temperature = 22.0 + rng.gen_range(-0.5..0.5);
        let humidity = 45.0 + rng.gen_range(-2.0..2.0);
        let motion = u8::from(rng.gen_bool(0.05));
        writeln!(log, "{},{:.1},{:.0},{}", ts, temperature, humidity, motion).unwrap();
    }
    log
}

fn config() -> TrainConfig {
    TrainConfig {
        rolling_window: 5,
        forest: ForestConfig::default(),
    }
}

#[test]
fn trained_artifact_survives_disk_and_scores() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("sensor_log.csv");
    fs::write(&log_path, quiet_room_log(600)).unwrap();

    let data = TrainingData::from_path(&log_path).unwrap();
    assert_eq!(data.dropped, 7);
    assert_eq!(data.rows.len(), 593);

    let artifact = train(&data.rows, &config()).unwrap();
    assert_eq!(artifact.trained_samples, 593 - 4);
    assert_eq!(artifact.outlier_label, PREDICTION_OUTLIER);
    assert!(matches!(artifact.model, ModelKind::IsolationForest(_)));

    let model_path = dir.path().join("models").join("model.json");
    artifact.save(&model_path).unwrap();

    let loaded = ModelArtifact::load(&model_path).unwrap();
    assert_eq!(loaded, artifact);
    assert!(loaded.check_window(5));

    let scorer = loaded.into_scorer();
    let typical = FeatureVector::new(22.0, 45.0, 0.0);
    let heatwave = FeatureVector::new(35.0, 10.0, 1.0);

    let typical_scored = scorer.score(&typical).unwrap();
    let heatwave_scored = scorer.score(&heatwave).unwrap();
    assert_eq!(typical_scored.verdict, Verdict::Inlier);
    assert_eq!(heatwave_scored.verdict, Verdict::Outlier);
    assert!(heatwave_scored.score > typical_scored.score);

    // Same vector, same verdict
    assert_eq!(scorer.score(&heatwave).unwrap(), heatwave_scored);
}

#[test]
fn training_is_reproducible() {
    let data = TrainingData::from_reader(quiet_room_log(300).as_bytes()).unwrap();
    let a = train(&data.rows, &config()).unwrap();
    let b = train(&data.rows, &config()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn missing_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelArtifact::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ArtifactError::NotFound { .. }));
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn hand_edited_label_refused_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let data = TrainingData::from_reader(quiet_room_log(100).as_bytes()).unwrap();
    let mut artifact = train(&data.rows, &config()).unwrap();
    artifact.outlier_label = 1;

    let path = dir.path().join("model.json");
    fs::write(&path, artifact.to_json().unwrap()).unwrap();

    assert!(matches!(
        ModelArtifact::load(&path),
        Err(ArtifactError::OutlierLabel { found: 1, .. })
    ));
}
