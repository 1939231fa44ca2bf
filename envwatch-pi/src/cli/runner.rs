use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use envwatch_core::time::LocalClock;
use envwatch_core::{
    ActuatorController, AlertLine, AnomalyLog, Detector, Recorder, RollingWindow, SensorLog,
    SensorSource,
};
use envwatch_ml::{
    train, ForestConfig, ModelArtifact, ModelKind, Scorer, TrainConfig, TrainingData, DEFAULT_SEED,
};

use super::{Cli, Command, RunArgs, TrainArgs};
use crate::config::Config;
use crate::sim::{ConsoleLine, SimulatedSensor};

/// Load the configuration and run the chosen command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Detect(args) => run_detect(&config, &args).await,
        Command::Record(args) => run_record(&config, &args).await,
        Command::Train(args) => run_train(&config, &args),
    }
}

/// Tick, then sleep, until `shutdown` resolves or a tick fails
///
/// The sleep races the shutdown future, so an interrupt ends the loop
/// without waiting out the interval. A tick in progress always finishes.
/// Returns the number of completed ticks.
pub async fn drive<E, F, S>(interval: Duration, shutdown: S, mut tick: F) -> Result<u64, E>
where
    F: FnMut() -> Result<(), E>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticks = 0;

    loop {
        tick()?;
        ticks += 1;

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                log::info!("interrupt received, stopping");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    Ok(ticks)
}

/// Resolves on Ctrl-C, or SIGTERM on unix
///
/// The handlers are installed when this is called, not when the future is
/// first polled, so a signal arriving during the first tick is not lost.
pub fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt = signal(SignalKind::interrupt());
        let terminate = signal(SignalKind::terminate());
        async move {
            match (interrupt, terminate) {
                (Ok(mut interrupt), Ok(mut terminate)) => {
                    tokio::select! {
                        _ = interrupt.recv() => {}
                        _ = terminate.recv() => {}
                    }
                }
                (Err(e), _) | (_, Err(e)) => {
                    log::error!("failed to install signal handlers: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

async fn run_detect(config: &Config, args: &RunArgs) -> anyhow::Result<()> {
    let interval = args.interval(config)?;

    let model_path = &config.model.model_path;
    let artifact = ModelArtifact::load(model_path)
        .with_context(|| format!("failed to load model artifact from {}", model_path.display()))?;
    artifact.check_window(config.model.rolling_window);
    let scorer = artifact.into_scorer();

    let sink = AnomalyLog::new(&config.logging.anomaly_log_file);
    if let Err(e) = sink.ensure_header() {
        log::warn!("{}", e);
    }

    if args.simulate {
        let sensor = SimulatedSensor::new(args.seed.unwrap_or_else(rand::random));
        let buzzer = ConsoleLine::new("buzzer");
        let led = ConsoleLine::new("led");
        detect(config, interval, sensor, scorer, buzzer, led, sink, shutdown_signal()).await
    } else {
        detect_on_hardware(config, interval, scorer, sink).await
    }
}

#[cfg(feature = "raspberry-pi")]
async fn detect_on_hardware(
    config: &Config,
    interval: Duration,
    scorer: Scorer<ModelKind>,
    sink: AnomalyLog,
) -> anyhow::Result<()> {
    let hw = crate::hardware::PiHardware::open(&config.gpio)?;
    detect(config, interval, hw.sensor, scorer, hw.buzzer, hw.led, sink, shutdown_signal()).await
}

#[cfg(not(feature = "raspberry-pi"))]
async fn detect_on_hardware(
    _config: &Config,
    _interval: Duration,
    _scorer: Scorer<ModelKind>,
    _sink: AnomalyLog,
) -> anyhow::Result<()> {
    Err(no_gpio())
}

/// Run the detector until shutdown or a fatal scoring error
///
/// The detector, and with it the alert outputs, is dropped before this
/// returns on every path.
#[allow(clippy::too_many_arguments)]
pub async fn detect<S, B, L>(
    config: &Config,
    interval: Duration,
    sensor: S,
    scorer: Scorer<ModelKind>,
    buzzer: B,
    led: L,
    sink: AnomalyLog,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    S: SensorSource,
    B: AlertLine,
    L: AlertLine,
{
    let window = RollingWindow::new(config.model.rolling_window)?;
    let actuators = ActuatorController::new(buzzer, led, config.alerts.into());
    let mut detector = Detector::new(sensor, window, scorer, actuators, sink);

    log::info!(
        "starting anomaly detection: window {}, every {:.1}s, log {}",
        config.model.rolling_window,
        interval.as_secs_f64(),
        config.logging.anomaly_log_file.display()
    );

    let result = drive(interval, shutdown, || detector.tick().map(|_| ())).await;
    detector.release();

    let stats = detector.stats();
    log::info!(
        "detection stopped: {} ticks, {} scored, {} anomalies, {} skipped reads, {} log failures",
        stats.ticks,
        stats.scored,
        stats.anomalies,
        stats.skipped_reads,
        stats.log_failures
    );

    result.context("detector stopped")?;
    Ok(())
}

async fn run_record(config: &Config, args: &RunArgs) -> anyhow::Result<()> {
    let interval = args.interval(config)?;

    if args.simulate {
        let sensor = SimulatedSensor::new(args.seed.unwrap_or_else(rand::random));
        record(config, interval, sensor, shutdown_signal()).await
    } else {
        record_on_hardware(config, interval).await
    }
}

#[cfg(feature = "raspberry-pi")]
async fn record_on_hardware(config: &Config, interval: Duration) -> anyhow::Result<()> {
    let sensor = crate::hardware::PiSensor::open(&config.gpio)?;
    record(config, interval, sensor, shutdown_signal()).await
}

#[cfg(not(feature = "raspberry-pi"))]
async fn record_on_hardware(_config: &Config, _interval: Duration) -> anyhow::Result<()> {
    Err(no_gpio())
}

/// Append raw readings to the sensor log until shutdown
pub async fn record<S: SensorSource>(
    config: &Config,
    interval: Duration,
    sensor: S,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let log = SensorLog::new(&config.logging.log_file);
    if let Err(e) = log.ensure_header() {
        log::warn!("{}", e);
    }

    log::info!(
        "recording sensor data every {:.1}s to {}",
        interval.as_secs_f64(),
        config.logging.log_file.display()
    );

    let mut recorder = Recorder::new(sensor, LocalClock, log);
    let ticks = drive(interval, shutdown, || {
        recorder.tick();
        Ok::<(), std::convert::Infallible>(())
    })
    .await
    .unwrap_or_else(|never| match never {});

    let stats = recorder.stats();
    log::info!(
        "recording stopped after {} ticks: {} rows, {} failed reads, {} log failures",
        ticks,
        stats.rows,
        stats.failed_reads,
        stats.log_failures
    );
    Ok(())
}

fn run_train(config: &Config, args: &TrainArgs) -> anyhow::Result<()> {
    let input = args.input.as_ref().unwrap_or(&config.logging.log_file);
    let output = args.output.as_ref().unwrap_or(&config.model.model_path);

    let data = TrainingData::from_path(input)
        .with_context(|| format!("failed to read training data from {}", input.display()))?;
    log::info!(
        "read {} complete rows from {} ({} incomplete rows dropped)",
        data.rows.len(),
        input.display(),
        data.dropped
    );

    let train_config = TrainConfig {
        rolling_window: config.model.rolling_window,
        forest: ForestConfig {
            contamination: config.model.contamination,
            seed: args.seed.unwrap_or(DEFAULT_SEED),
            ..ForestConfig::default()
        },
    };

    let artifact = train(&data.rows, &train_config).context("training failed")?;
    artifact
        .save(output)
        .with_context(|| format!("failed to save model artifact to {}", output.display()))?;
    Ok(())
}

#[cfg(not(feature = "raspberry-pi"))]
fn no_gpio() -> anyhow::Error {
    anyhow::anyhow!("this build has no GPIO support; rebuild with --features raspberry-pi or pass --simulate")
}
