use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::metrics::{
    Calibration, DEFAULT_DISK_PERCENT_PER_MBS, DEFAULT_DOWNLOAD_KBS_PER_PERCENT,
    DEFAULT_UPLOAD_KBS_PER_PERCENT,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub general: GeneralConfig,
    pub sampler: SamplerConfig,
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            write_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub interval_ms: u64,
    /// Zero means "same as `interval_ms`".
    pub tick_timeout_ms: u64,
    pub log_level: String,
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_ms: 1000,
            tick_timeout_ms: 0,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn tick_timeout(&self) -> Duration {
        match self.tick_timeout_ms {
            0 => self.interval(),
            ms => Duration::from_millis(ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Pin a network interface by name instead of using the default selection.
    pub interface: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub upload_kbs_per_percent: f64,
    pub download_kbs_per_percent: f64,
    pub disk_percent_per_mbs: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            upload_kbs_per_percent: DEFAULT_UPLOAD_KBS_PER_PERCENT,
            download_kbs_per_percent: DEFAULT_DOWNLOAD_KBS_PER_PERCENT,
            disk_percent_per_mbs: DEFAULT_DISK_PERCENT_PER_MBS,
        }
    }
}

impl From<&CalibrationConfig> for Calibration {
    fn from(cfg: &CalibrationConfig) -> Self {
        Calibration {
            upload_kbs_per_percent: cfg.upload_kbs_per_percent,
            download_kbs_per_percent: cfg.download_kbs_per_percent,
            disk_percent_per_mbs: cfg.disk_percent_per_mbs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("general.interval_ms must be greater than 0")]
    ZeroInterval,
    #[error("serial.baud_rate must be greater than 0")]
    ZeroBaudRate,
    #[error("serial.port must not be empty")]
    EmptyPort,
    #[error("calibration.{0} must be a positive finite number")]
    BadCalibration(&'static str),
}

impl Config {
    /// `needs_serial` is false when records go to stdout, which makes the port irrelevant.
    pub fn validate(&self, needs_serial: bool) -> Result<(), ConfigError> {
        if self.general.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if needs_serial {
            if self.serial.baud_rate == 0 {
                return Err(ConfigError::ZeroBaudRate);
            }
            if self.serial.port.trim().is_empty() {
                return Err(ConfigError::EmptyPort);
            }
        }
        let cal = &self.calibration;
        for (name, value) in [
            ("upload_kbs_per_percent", cal.upload_kbs_per_percent),
            ("download_kbs_per_percent", cal.download_kbs_per_percent),
            ("disk_percent_per_mbs", cal.disk_percent_per_mbs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::BadCalibration(name));
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pcmon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.general.interval_ms, 1000);
        assert_eq!(config.general.log_format, "text");
        assert!(config.sampler.interface.is_none());
        assert_eq!(config.calibration.upload_kbs_per_percent, 5.0);
        assert_eq!(config.calibration.download_kbs_per_percent, 10.0);
        assert_eq!(config.calibration.disk_percent_per_mbs, 2.0);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[serial]
port = "COM8"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.port, "COM8");
        // Other fields should be defaults
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.general.interval_ms, 1000);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[serial]
port = "/dev/ttyACM0"
baud_rate = 9600
write_timeout_ms = 250

[general]
interval_ms = 2000
tick_timeout_ms = 750
log_level = "debug"
log_format = "json"

[sampler]
interface = "eth0"

[calibration]
upload_kbs_per_percent = 50.0
download_kbs_per_percent = 100.0
disk_percent_per_mbs = 0.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.write_timeout_ms, 250);
        assert_eq!(config.general.interval(), Duration::from_millis(2000));
        assert_eq!(config.general.tick_timeout(), Duration::from_millis(750));
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.sampler.interface.as_deref(), Some("eth0"));
        let cal = Calibration::from(&config.calibration);
        assert!((cal.disk_percent_per_mbs - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn tick_timeout_defaults_to_interval() {
        let general = GeneralConfig {
            interval_ms: 1500,
            ..GeneralConfig::default()
        };
        assert_eq!(general.tick_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.interval_ms, 1000);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("pcmon_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.general.interval_ms, 1000);
        let _ = std::fs::remove_file(&temp);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        assert_eq!(config.validate(true), Ok(()));

        config.general.interval_ms = 0;
        assert_eq!(config.validate(true), Err(ConfigError::ZeroInterval));
        config.general.interval_ms = 1000;

        config.serial.port = "  ".to_string();
        assert_eq!(config.validate(true), Err(ConfigError::EmptyPort));
        assert_eq!(config.validate(false), Ok(()));

        config.calibration.download_kbs_per_percent = f64::NAN;
        assert_eq!(
            config.validate(false),
            Err(ConfigError::BadCalibration("download_kbs_per_percent"))
        );
    }
}
