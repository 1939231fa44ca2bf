//! Configuration file
//!
//! ```json
//! {
//!   "GPIO":    { "DHT_PIN": 4, "PIR_PIN": 17, "BUZZER_PIN": 27, "LED_PIN": 22 },
//!   "MODEL":   { "model_path": "models/model.json", "rolling_window": 5, "contamination": 0.05 },
//!   "LOGGING": { "log_file": "data/sensor_log.csv", "anomaly_log_file": "data/anomaly_log.csv", "interval_sec": 2 },
//!   "ALERTS":  { "use_buzzer": true, "use_led": true }
//! }
//! ```
//!
//! Loaded and validated once at startup; every command reads it. A bad value
//! is fatal and names the field, so a typo never turns into a silently
//! different detector.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use envwatch_core::AlertConfig;
use envwatch_ml::DEFAULT_CONTAMINATION;
use serde::{Deserialize, Serialize};

/// Highest BCM pin on the 40-pin header
pub const MAX_BCM_PIN: u8 = 27;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// File missing or unreadable
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Not valid JSON, or a field is missing or has the wrong type
    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed, but a value is out of range
    #[error("invalid configuration value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Full configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "GPIO")]
    pub gpio: GpioConfig,
    #[serde(rename = "MODEL")]
    pub model: ModelConfig,
    #[serde(rename = "LOGGING")]
    pub logging: LoggingConfig,
    #[serde(rename = "ALERTS")]
    pub alerts: AlertsConfig,
}

/// BCM pin numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GpioConfig {
    pub dht_pin: u8,
    pub pir_pin: u8,
    pub buzzer_pin: u8,
    pub led_pin: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact written by `train`, read by `detect`
    pub model_path: PathBuf,
    /// Readings averaged per verdict (W)
    pub rolling_window: usize,
    /// Expected share of outliers in the training data
    #[serde(default = "default_contamination")]
    pub contamination: f64,
}

fn default_contamination() -> f64 {
    DEFAULT_CONTAMINATION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Raw sensor log written by `record`
    pub log_file: PathBuf,
    /// Scored readings written by `detect`
    pub anomaly_log_file: PathBuf,
    /// Seconds between ticks
    pub interval_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub use_buzzer: bool,
    pub use_led: bool,
}

impl From<AlertsConfig> for AlertConfig {
    fn from(alerts: AlertsConfig) -> Self {
        AlertConfig {
            use_buzzer: alerts.use_buzzer,
            use_led: alerts.use_led,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gpio: GpioConfig {
                dht_pin: 4,
                pir_pin: 17,
                buzzer_pin: 27,
                led_pin: 22,
            },
            model: ModelConfig {
                model_path: PathBuf::from("models/model.json"),
                rolling_window: 5,
                contamination: DEFAULT_CONTAMINATION,
            },
            logging: LoggingConfig {
                log_file: PathBuf::from("data/sensor_log.csv"),
                anomaly_log_file: PathBuf::from("data/anomaly_log.csv"),
                interval_sec: 2.0,
            },
            alerts: AlertsConfig {
                use_buzzer: true,
                use_led: true,
            },
        }
    }
}

impl Config {
    /// Read, parse and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.rolling_window == 0 {
            return Err(invalid("MODEL.rolling_window", "must be at least 1"));
        }

        let c = self.model.contamination;
        if !(c > 0.0 && c <= 0.5) {
            return Err(invalid("MODEL.contamination", format!("must be in (0, 0.5], got {}", c)));
        }

        let interval = self.logging.interval_sec;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(invalid(
                "LOGGING.interval_sec",
                format!("must be a positive number of seconds, got {}", interval),
            ));
        }

        for (field, path) in [
            ("MODEL.model_path", &self.model.model_path),
            ("LOGGING.log_file", &self.logging.log_file),
            ("LOGGING.anomaly_log_file", &self.logging.anomaly_log_file),
        ] {
            if path.as_os_str().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        self.gpio.validate()
    }
}

impl GpioConfig {
    fn pins(&self) -> [(&'static str, u8); 4] {
        [
            ("GPIO.DHT_PIN", self.dht_pin),
            ("GPIO.PIR_PIN", self.pir_pin),
            ("GPIO.BUZZER_PIN", self.buzzer_pin),
            ("GPIO.LED_PIN", self.led_pin),
        ]
    }

    /// Pins exist on the header and no two functions share one
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = self.pins();
        for (i, &(field, pin)) in pins.iter().enumerate() {
            if pin > MAX_BCM_PIN {
                return Err(invalid(field, format!("BCM pin {} does not exist (max {})", pin, MAX_BCM_PIN)));
            }
            if let Some((other, _)) = pins[..i].iter().find(|(_, p)| *p == pin) {
                return Err(invalid(field, format!("pin {} is already used by {}", pin, other)));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "GPIO": { "DHT_PIN": 4, "PIR_PIN": 17, "BUZZER_PIN": 27, "LED_PIN": 22 },
        "MODEL": { "model_path": "models/model.json", "rolling_window": 5 },
        "LOGGING": {
            "log_file": "data/sensor_log.csv",
            "anomaly_log_file": "data/anomaly_log.csv",
            "interval_sec": 2
        },
        "ALERTS": { "use_buzzer": true, "use_led": true }
    }"#;

    fn parse(text: &str) -> Config {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn sample_file_parses_to_default() {
        let config = parse(SAMPLE);
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.logging.interval_sec, 2.0);
        assert_eq!(AlertConfig::from(config.alerts), AlertConfig::default());
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn missing_section_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "GPIO": { "DHT_PIN": 4 } }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn zero_window_rejected() {
        let mut config = Config::default();
        config.model.rolling_window = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "MODEL.rolling_window", .. })
        ));
    }

    #[test]
    fn bad_interval_rejected() {
        for interval in [0.0, -2.0, f64::INFINITY] {
            let mut config = Config::default();
            config.logging.interval_sec = interval;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Invalid { field: "LOGGING.interval_sec", .. })
            ));
        }
    }

    #[test]
    fn contamination_bounds() {
        let mut config = Config::default();
        config.model.contamination = 0.5;
        assert!(config.validate().is_ok());

        config.model.contamination = 0.0;
        assert!(config.validate().is_err());
        config.model.contamination = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shared_pin_rejected() {
        let mut config = Config::default();
        config.gpio.led_pin = config.gpio.buzzer_pin;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "GPIO.LED_PIN", .. }));
        assert!(err.to_string().contains("GPIO.BUZZER_PIN"));
    }

    #[test]
    fn pin_off_the_header_rejected() {
        let mut config = Config::default();
        config.gpio.dht_pin = 40;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "GPIO.DHT_PIN", .. })
        ));
    }

    #[test]
    fn empty_path_rejected() {
        let mut config = Config::default();
        config.logging.anomaly_log_file = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "LOGGING.anomaly_log_file", .. })
        ));
    }
}
