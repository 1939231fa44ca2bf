use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

mod logger;
mod runner;

pub use logger::init_logger;
pub use runner::{detect, drive, record, run, shutdown_signal};

/// Environmental anomaly detector for a Raspberry Pi
#[derive(Parser, Debug)]
#[command(name = "envwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.json", global = true)]
    pub config: PathBuf,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show debug messages
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score live readings and drive the alert outputs
    Detect(RunArgs),

    /// Append raw readings to the sensor log for training
    Record(RunArgs),

    /// Fit a model on the sensor log and save the artifact
    Train(TrainArgs),
}

/// Options shared by the long-running commands
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Use the simulated sensor and console outputs instead of GPIO
    #[arg(long)]
    pub simulate: bool,

    /// Seconds between ticks (overrides LOGGING.interval_sec)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<f64>,

    /// Seed for the simulated sensor
    #[arg(long, value_name = "SEED", requires = "simulate")]
    pub seed: Option<u64>,
}

impl RunArgs {
    /// Tick interval after applying the command line override
    pub fn interval(&self, config: &Config) -> anyhow::Result<Duration> {
        let secs = self.interval.unwrap_or(config.logging.interval_sec);
        Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| anyhow::anyhow!("interval must be a positive number of seconds, got {}", secs))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// Sensor log to train on (defaults to LOGGING.log_file)
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Where to write the artifact (defaults to MODEL.model_path)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Forest seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_defaults() {
        let cli = Cli::parse_from(["envwatch", "detect"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.quiet);
        match cli.command {
            Command::Detect(args) => {
                assert!(!args.simulate);
                assert_eq!(args.interval, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "envwatch", "record", "--simulate", "--interval", "0.5", "--config", "bench.json", "-q",
        ]);
        assert_eq!(cli.config, PathBuf::from("bench.json"));
        assert!(cli.quiet);
        match cli.command {
            Command::Record(args) => {
                assert!(args.simulate);
                assert_eq!(args.interval, Some(0.5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn seed_needs_simulate() {
        assert!(Cli::try_parse_from(["envwatch", "detect", "--seed", "3"]).is_err());
    }

    #[test]
    fn interval_override_wins() {
        let config = Config::default();
        let args = RunArgs { interval: Some(0.25), ..RunArgs::default() };
        assert_eq!(args.interval(&config).unwrap(), Duration::from_millis(250));
        assert_eq!(RunArgs::default().interval(&config).unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn bad_interval_override_rejected() {
        let config = Config::default();
        for secs in [0.0, -1.0, f64::NAN] {
            let args = RunArgs { interval: Some(secs), ..RunArgs::default() };
            assert!(args.interval(&config).is_err());
        }
    }
}
