//! Engine configuration management

use crate::api::types::PrecisionSettings;
use crate::core::{DEFAULT_DUPLICATE_TOLERANCE_DEG, MAX_SLOPE_DEG};
use crate::validation::accuracy::DEFAULT_DIVERGENCE_THRESHOLD_PCT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound for the merge tolerance, roughly 100 m of latitude
const MAX_DUPLICATE_TOLERANCE_DEG: f64 = 1e-3;
const MAX_DECIMAL_PLACES: u8 = 10;
const MAX_ELEVATION_TIMEOUT_MS: u64 = 120_000;

/// Measurement engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output units, rounding and pipeline toggles
    pub precision: PrecisionSettings,
    /// Inter-pass deviation (%) above which a result carries a divergence warning
    pub divergence_threshold_pct: f64,
    /// Budget for the single batched elevation lookup
    pub elevation_timeout_ms: u64,
    /// Return a 2D result when elevations cannot be obtained
    pub allow_2d_fallback: bool,
    /// Consecutive vertices closer than this (degrees) are merged; applies to
    /// the boundary, sections and exclusions alike
    pub duplicate_tolerance_deg: f64,
    /// Slope clamp for the correction factor (degrees)
    pub max_slope_deg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: PrecisionSettings::default(),
            divergence_threshold_pct: DEFAULT_DIVERGENCE_THRESHOLD_PCT,
            elevation_timeout_ms: 10_000,
            allow_2d_fallback: false,
            duplicate_tolerance_deg: DEFAULT_DUPLICATE_TOLERANCE_DEG,
            max_slope_deg: MAX_SLOPE_DEG,
        }
    }
}

impl EngineConfig {
    pub fn elevation_timeout(&self) -> Duration {
        Duration::from_millis(self.elevation_timeout_ms)
    }

    pub fn with_precision(mut self, precision: PrecisionSettings) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_2d_fallback(mut self, allow: bool) -> Self {
        self.allow_2d_fallback = allow;
        self
    }

    pub fn with_elevation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.elevation_timeout_ms = timeout_ms;
        self
    }

    pub fn with_duplicate_tolerance_deg(mut self, tolerance_deg: f64) -> Self {
        self.duplicate_tolerance_deg = tolerance_deg;
        self
    }

    pub fn with_divergence_threshold_pct(mut self, threshold_pct: f64) -> Self {
        self.divergence_threshold_pct = threshold_pct;
        self
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },

    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no file path set for saving configuration")]
    NoFilePath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of validating a configuration
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error, if any, consuming the report
    pub fn into_result(self) -> ConfigResult<Vec<String>> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

/// Validate every parameter of `config`
pub fn validate(config: &EngineConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Err(e) = check_decimal_places(config.precision.decimal_places) {
        report.errors.push(e);
    } else if config.precision.decimal_places > 6 {
        report.warnings.push(format!(
            "{} decimal places exceeds the precision of the input coordinates",
            config.precision.decimal_places
        ));
    }

    if let Err(e) = check_divergence_threshold(config.divergence_threshold_pct) {
        report.errors.push(e);
    } else if config.divergence_threshold_pct > 20.0 {
        report.warnings.push(format!(
            "divergence threshold {}% will hide most acquisition problems",
            config.divergence_threshold_pct
        ));
    }

    if let Err(e) = check_elevation_timeout(config.elevation_timeout_ms) {
        report.errors.push(e);
    } else if config.elevation_timeout_ms < 100 {
        report.warnings.push(format!(
            "elevation timeout {} ms is shorter than typical service latency",
            config.elevation_timeout_ms
        ));
    }

    if let Err(e) = check_duplicate_tolerance(config.duplicate_tolerance_deg) {
        report.errors.push(e);
    } else if config.duplicate_tolerance_deg > 1e-5 {
        report.warnings.push(format!(
            "duplicate tolerance {}° merges vertices more than a meter apart",
            config.duplicate_tolerance_deg
        ));
    }

    if let Err(e) = check_max_slope(config.max_slope_deg) {
        report.errors.push(e);
    }

    report
}

fn check_decimal_places(decimal_places: u8) -> ConfigResult<()> {
    if decimal_places > MAX_DECIMAL_PLACES {
        return Err(ConfigError::invalid(
            "decimal_places",
            decimal_places,
            "at most 10 decimal places are supported",
        ));
    }
    Ok(())
}

fn check_divergence_threshold(threshold_pct: f64) -> ConfigResult<()> {
    if !threshold_pct.is_finite() || threshold_pct <= 0.0 || threshold_pct > 100.0 {
        return Err(ConfigError::invalid(
            "divergence_threshold_pct",
            threshold_pct,
            "must be in (0, 100]",
        ));
    }
    Ok(())
}

fn check_elevation_timeout(timeout_ms: u64) -> ConfigResult<()> {
    if timeout_ms == 0 || timeout_ms > MAX_ELEVATION_TIMEOUT_MS {
        return Err(ConfigError::invalid(
            "elevation_timeout_ms",
            timeout_ms,
            "must be between 1 and 120000 ms",
        ));
    }
    Ok(())
}

fn check_duplicate_tolerance(tolerance_deg: f64) -> ConfigResult<()> {
    if !tolerance_deg.is_finite() || !(0.0..=MAX_DUPLICATE_TOLERANCE_DEG).contains(&tolerance_deg) {
        return Err(ConfigError::invalid(
            "duplicate_tolerance_deg",
            tolerance_deg,
            "must be between 0 and 0.001 degrees",
        ));
    }
    Ok(())
}

fn check_max_slope(max_slope_deg: f64) -> ConfigResult<()> {
    if !max_slope_deg.is_finite() || max_slope_deg <= 0.0 || max_slope_deg > MAX_SLOPE_DEG {
        return Err(ConfigError::invalid("max_slope_deg", max_slope_deg, "must be in (0, 89]"));
    }
    Ok(())
}

/// Owns an `EngineConfig` and its backing file
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: EngineConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager from a validated configuration
    pub fn with_config(config: EngineConfig) -> ConfigResult<Self> {
        validate(&config).into_result()?;
        Ok(Self { config, ..Default::default() })
    }

    /// Create a manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.config)
    }

    /// Replace the whole configuration after validation
    pub fn update_config(&mut self, config: EngineConfig) -> ConfigResult<EngineConfig> {
        validate(&config).into_result()?;
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config, config))
    }

    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;

        let warnings = validate(&config).into_result()?;
        for warning in warnings {
            log::warn!("{}: {}", path.display(), warning);
        }

        self.config = config;
        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.config)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the file last loaded or saved
    pub fn save(&mut self) -> ConfigResult<()> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::NoFilePath),
        }
    }

    /// Check if configuration has been modified since last load or save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment; each setter returns the previous value

    pub fn set_precision(&mut self, precision: PrecisionSettings) -> ConfigResult<PrecisionSettings> {
        check_decimal_places(precision.decimal_places)?;
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.precision, precision))
    }

    pub fn set_divergence_threshold(&mut self, threshold_pct: f64) -> ConfigResult<f64> {
        check_divergence_threshold(threshold_pct)?;
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.divergence_threshold_pct, threshold_pct))
    }

    pub fn set_elevation_timeout(&mut self, timeout_ms: u64) -> ConfigResult<u64> {
        check_elevation_timeout(timeout_ms)?;
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.elevation_timeout_ms, timeout_ms))
    }

    pub fn set_duplicate_tolerance(&mut self, tolerance_deg: f64) -> ConfigResult<f64> {
        check_duplicate_tolerance(tolerance_deg)?;
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.duplicate_tolerance_deg, tolerance_deg))
    }

    pub fn set_max_slope(&mut self, max_slope_deg: f64) -> ConfigResult<f64> {
        check_max_slope(max_slope_deg)?;
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.max_slope_deg, max_slope_deg))
    }

    pub fn set_allow_2d_fallback(&mut self, allow: bool) -> bool {
        self.is_modified = true;
        std::mem::replace(&mut self.config.allow_2d_fallback, allow)
    }
}
