//! Benchmark harness configuration.
//!
//! Loads [`BenchConfig`] from a TOML file (`gpubench.toml`) with environment
//! variable overrides via `GPUBENCH_*` prefixed variables. Every field has a
//! default, so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gpubench.toml";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    /// Override: `GPUBENCH_LOG_LEVEL`
    pub level: String,
    /// Override: `GPUBENCH_LOG_FORMAT`
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

/// Lifecycle options applied by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Run the warm-up pass before the timed run.
    /// Override: `GPUBENCH_WARM_UP`
    pub warm_up: bool,
    /// Seed for input data generation; `None` seeds from OS entropy.
    /// Override: `GPUBENCH_SEED`
    pub seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { warm_up: true, seed: None }
    }
}

/// Limits of the built-in host device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostDeviceConfig {
    /// Worker threads; `None` uses the available parallelism.
    /// Override: `GPUBENCH_THREADS`
    pub threads: Option<usize>,
    /// Maximum work-group size reported by the host device.
    /// Override: `GPUBENCH_MAX_WORK_GROUP_SIZE`
    pub max_work_group_size: usize,
}

impl Default for HostDeviceConfig {
    fn default() -> Self {
        Self { threads: None, max_work_group_size: 256 }
    }
}

/// An additional, simulated device with explicit limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedDeviceConfig {
    pub name: String,
    pub max_work_group_size: usize,
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Standard matrix dimensions (`r1 × k` times `k × c2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub r1: usize,
    pub k: usize,
    pub c2: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self { r1: 10_000, k: 10_000, c2: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrigonometryConfig {
    pub elements: usize,
    /// Applications of the function per element.
    pub iterations: usize,
}

impl Default for TrigonometryConfig {
    fn default() -> Self {
        Self { elements: 1 << 24, iterations: 64 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub bytes: usize,
    pub round_trips: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { bytes: 256 * 1024 * 1024, round_trips: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    pub width: usize,
    pub height: usize,
    pub max_iterations: u32,
    pub zoom: f64,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self { width: 3840, height: 2160, max_iterations: 1000, zoom: 1.0 }
    }
}

/// Problem sizes used by the composite standard benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardConfig {
    pub matrix_dim: usize,
    pub elements: usize,
    pub bytes: usize,
    pub fractal_dim: usize,
}

impl Default for StandardConfig {
    fn default() -> Self {
        Self { matrix_dim: 1024, elements: 1 << 22, bytes: 64 * 1024 * 1024, fractal_dim: 1024 }
    }
}

/// Main gpubench configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub logging: LoggingConfig,
    /// Base name of the result log; `.csv` is appended.
    /// Override: `GPUBENCH_LOG_FILE`
    pub log_file: PathBuf,
    pub runner: RunnerConfig,
    pub host: HostDeviceConfig,
    pub devices: Vec<SimulatedDeviceConfig>,
    pub matrix: MatrixConfig,
    pub trigonometry: TrigonometryConfig,
    pub transfer: TransferConfig,
    pub fractals: FractalConfig,
    pub standard: StandardConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            log_file: PathBuf::from("logs"),
            runner: RunnerConfig::default(),
            host: HostDeviceConfig::default(),
            devices: Vec::new(),
            matrix: MatrixConfig::default(),
            trigonometry: TrigonometryConfig::default(),
            transfer: TransferConfig::default(),
            fractals: FractalConfig::default(),
            standard: StandardConfig::default(),
        }
    }
}

/// Errors that can occur when loading or validating a [`BenchConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride { key: String, value: String, reason: String },
}

fn parse_env<T>(key: &str, val: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    val.parse::<T>().map_err(|e| ConfigError::EnvOverride {
        key: key.into(),
        value: val.into(),
        reason: e.to_string(),
    })
}

fn require_positive(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!("{field} must be > 0")));
    }
    Ok(())
}

impl BenchConfig {
    /// Render the default configuration as TOML.
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// Load configuration from a TOML file, then apply environment
    /// variable overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: BenchConfig = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load only from environment variables, starting from defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration");
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::from_env()
        }
    }

    /// Path of the CSV result log derived from `log_file`.
    pub fn log_path(&self) -> PathBuf {
        let mut name = self.log_file.clone().into_os_string();
        name.push(".csv");
        PathBuf::from(name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation("log_file must not be empty".into()));
        }
        require_positive("host.max_work_group_size", self.host.max_work_group_size)?;
        if self.host.threads == Some(0) {
            return Err(ConfigError::Validation("host.threads must be > 0".into()));
        }
        for dev in &self.devices {
            if dev.name.trim().is_empty() {
                return Err(ConfigError::Validation("device name must not be empty".into()));
            }
            require_positive(&format!("devices.{}.max_work_group_size", dev.name), dev.max_work_group_size)?;
        }
        require_positive("matrix.r1", self.matrix.r1)?;
        require_positive("matrix.k", self.matrix.k)?;
        require_positive("matrix.c2", self.matrix.c2)?;
        require_positive("trigonometry.elements", self.trigonometry.elements)?;
        require_positive("trigonometry.iterations", self.trigonometry.iterations)?;
        require_positive("transfer.bytes", self.transfer.bytes)?;
        require_positive("transfer.round_trips", self.transfer.round_trips)?;
        require_positive("fractals.width", self.fractals.width)?;
        require_positive("fractals.height", self.fractals.height)?;
        if self.fractals.max_iterations == 0 {
            return Err(ConfigError::Validation("fractals.max_iterations must be > 0".into()));
        }
        if !(self.fractals.zoom.is_finite() && self.fractals.zoom > 0.0) {
            return Err(ConfigError::Validation(format!(
                "fractals.zoom must be a positive finite number, got {}",
                self.fractals.zoom
            )));
        }
        require_positive("standard.matrix_dim", self.standard.matrix_dim)?;
        require_positive("standard.elements", self.standard.elements)?;
        require_positive("standard.bytes", self.standard.bytes)?;
        require_positive("standard.fractal_dim", self.standard.fractal_dim)?;
        Ok(())
    }

    /// Apply `GPUBENCH_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("GPUBENCH_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("GPUBENCH_LOG_FORMAT") {
            self.logging.format = parse_env("GPUBENCH_LOG_FORMAT", &val)?;
        }

        if let Ok(val) = std::env::var("GPUBENCH_LOG_FILE") {
            self.log_file = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("GPUBENCH_SEED") {
            self.runner.seed = Some(parse_env("GPUBENCH_SEED", &val)?);
        }

        if let Ok(val) = std::env::var("GPUBENCH_WARM_UP") {
            self.runner.warm_up = match val.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::EnvOverride {
                        key: "GPUBENCH_WARM_UP".into(),
                        value: val,
                        reason: "expected a boolean".into(),
                    });
                }
            };
        }

        if let Ok(val) = std::env::var("GPUBENCH_MAX_WORK_GROUP_SIZE") {
            self.host.max_work_group_size = parse_env("GPUBENCH_MAX_WORK_GROUP_SIZE", &val)?;
        }

        if let Ok(val) = std::env::var("GPUBENCH_THREADS") {
            self.host.threads = Some(parse_env("GPUBENCH_THREADS", &val)?);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: [&str; 7] = [
        "GPUBENCH_LOG_LEVEL",
        "GPUBENCH_LOG_FORMAT",
        "GPUBENCH_LOG_FILE",
        "GPUBENCH_SEED",
        "GPUBENCH_WARM_UP",
        "GPUBENCH_MAX_WORK_GROUP_SIZE",
        "GPUBENCH_THREADS",
    ];

    fn with_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ENV_KEYS
            .iter()
            .map(|key| {
                let val = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, val)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(BenchConfig::default().validate().is_ok());
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_default_toml_round_trips() {
        with_env(&[], || {
            let toml_str = BenchConfig::default_toml().unwrap();
            let cfg = BenchConfig::from_toml(&toml_str).unwrap();
            assert_eq!(cfg, BenchConfig::default());
        });
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_partial_file_uses_defaults() {
        with_env(&[], || {
            let cfg = BenchConfig::from_toml(
                r#"
log_file = "results"

[matrix]
r1 = 4
k = 3
c2 = 2

[[devices]]
name = "Mock GPU"
max_work_group_size = 4
"#,
            )
            .unwrap();
            assert_eq!(cfg.matrix, MatrixConfig { r1: 4, k: 3, c2: 2 });
            assert_eq!(cfg.devices.len(), 1);
            assert_eq!(cfg.devices[0].threads, None);
            assert_eq!(cfg.trigonometry, TrigonometryConfig::default());
            assert_eq!(cfg.log_path(), PathBuf::from("results.csv"));
        });
    }

    #[test]
    fn test_standard_matrix_is_ten_thousand() {
        let cfg = MatrixConfig::default();
        assert_eq!((cfg.r1, cfg.k, cfg.c2), (10_000, 10_000, 10_000));
    }

    #[test]
    fn test_validation_zero_group_size() {
        let mut cfg = BenchConfig::default();
        cfg.host.max_work_group_size = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("host.max_work_group_size must be > 0"));
    }

    #[test]
    fn test_validation_simulated_device() {
        let mut cfg = BenchConfig::default();
        cfg.devices.push(SimulatedDeviceConfig {
            name: "broken".into(),
            max_work_group_size: 0,
            threads: None,
        });
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("devices.broken.max_work_group_size"));
    }

    #[test]
    fn test_validation_zoom() {
        let mut cfg = BenchConfig::default();
        cfg.fractals.zoom = f64::NAN;
        assert!(cfg.validate().is_err());
        cfg.fractals.zoom = -2.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validation_empty_log_file() {
        let mut cfg = BenchConfig::default();
        cfg.log_file = PathBuf::new();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("log_file must not be empty"));
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_env_override_multiple_fields() {
        with_env(
            &[
                ("GPUBENCH_LOG_LEVEL", "debug"),
                ("GPUBENCH_LOG_FORMAT", "json"),
                ("GPUBENCH_LOG_FILE", "bench-history"),
                ("GPUBENCH_SEED", "42"),
                ("GPUBENCH_WARM_UP", "off"),
                ("GPUBENCH_MAX_WORK_GROUP_SIZE", "64"),
                ("GPUBENCH_THREADS", "2"),
            ],
            || {
                let cfg = BenchConfig::from_env().unwrap();
                assert_eq!(cfg.logging.level, "debug");
                assert_eq!(cfg.logging.format, LogFormat::Json);
                assert_eq!(cfg.log_path(), PathBuf::from("bench-history.csv"));
                assert_eq!(cfg.runner.seed, Some(42));
                assert!(!cfg.runner.warm_up);
                assert_eq!(cfg.host.max_work_group_size, 64);
                assert_eq!(cfg.host.threads, Some(2));
            },
        );
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_env_override_invalid_seed() {
        with_env(&[("GPUBENCH_SEED", "not-a-number")], || match BenchConfig::from_env() {
            Err(ConfigError::EnvOverride { key, .. }) => assert_eq!(key, "GPUBENCH_SEED"),
            other => panic!("expected EnvOverride, got: {other:?}"),
        });
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_env_override_invalid_bool() {
        with_env(&[("GPUBENCH_WARM_UP", "maybe")], || {
            let err = BenchConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::EnvOverride { .. }));
        });
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_load_from_tempfile() {
        with_env(&[], || {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(DEFAULT_CONFIG_FILE);
            std::fs::write(&path, BenchConfig::default_toml().unwrap()).unwrap();
            let cfg = BenchConfig::load(&path).unwrap();
            assert_eq!(cfg, BenchConfig::default());
        });
    }

    #[test]
    #[serial(gpubench_env)]
    fn test_load_or_default_missing_file() {
        with_env(&[], || {
            let cfg = BenchConfig::load_or_default(Path::new("/nonexistent/gpubench.toml")).unwrap();
            assert_eq!(cfg, BenchConfig::default());
        });
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = BenchConfig::load(Path::new("/nonexistent/gpubench.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_log_format_display_roundtrip() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            let parsed: LogFormat = format.to_string().parse().unwrap();
            assert_eq!(parsed, format);
        }
    }
}
