//! Detector configuration
//!
//! Defaults reproduce the long-running deployment: three quarters of the
//! available memory, memory sampled every second, data scanned every ten.

use std::path::PathBuf;
use std::time::Duration;

use crate::DetectorError;

/// Tunable parameters for the detector
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Fraction of (free + already monitored) memory to occupy
    pub usage_rate: f64,

    /// Period between free-memory samples
    pub memory_check_period: Duration,

    /// Period between arena scans
    pub data_check_period: Duration,

    /// Relative size change that triggers a reallocation
    pub relative_change_threshold: f64,

    /// Location of the persisted statistics document
    pub statistics_path: PathBuf,

    /// Optional debug log file (appended)
    pub log_file: Option<PathBuf>,

    /// Probability of flipping one arena bit before each scan (diagnostics only)
    pub simulate_upset_probability: Option<f64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            usage_rate: 0.75,
            memory_check_period: Duration::from_secs(1),
            data_check_period: Duration::from_secs(10),
            relative_change_threshold: 0.2,
            statistics_path: PathBuf::from("stat.json"),
            log_file: Some(PathBuf::from("detector.log")),
            simulate_upset_probability: None,
        }
    }
}

impl DetectorConfig {
    /// Set the memory usage rate.
    pub fn with_usage_rate(mut self, usage_rate: f64) -> Self {
        self.usage_rate = usage_rate;
        self
    }

    /// Set both check periods.
    pub fn with_periods(mut self, memory: Duration, data: Duration) -> Self {
        self.memory_check_period = memory;
        self.data_check_period = data;
        self
    }

    /// Set the reallocation threshold.
    pub fn with_relative_change_threshold(mut self, threshold: f64) -> Self {
        self.relative_change_threshold = threshold;
        self
    }

    /// Set the statistics file location.
    pub fn with_statistics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.statistics_path = path.into();
        self
    }

    /// Set or clear the debug log file.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// Enable simulated upsets with the given per-scan probability.
    pub fn with_simulated_upsets(mut self, probability: Option<f64>) -> Self {
        self.simulate_upset_probability = probability;
        self
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), DetectorError> {
        if !(self.usage_rate > 0.0 && self.usage_rate <= 1.0) {
            return Err(DetectorError::InvalidConfiguration(format!(
                "usage rate must be in (0, 1], got {}",
                self.usage_rate
            )));
        }
        if self.memory_check_period.is_zero() || self.data_check_period.is_zero() {
            return Err(DetectorError::InvalidConfiguration(
                "check periods must be > 0".to_string(),
            ));
        }
        if !self.relative_change_threshold.is_finite() || self.relative_change_threshold < 0.0 {
            return Err(DetectorError::InvalidConfiguration(format!(
                "relative change threshold must be finite and >= 0, got {}",
                self.relative_change_threshold
            )));
        }
        if let Some(p) = self.simulate_upset_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(DetectorError::InvalidConfiguration(format!(
                    "simulated upset probability must be in [0, 1], got {}",
                    p
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.usage_rate, 0.75);
        assert_eq!(config.memory_check_period, Duration::from_secs(1));
        assert_eq!(config.data_check_period, Duration::from_secs(10));
        assert_eq!(config.statistics_path, PathBuf::from("stat.json"));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(DetectorConfig::default().with_usage_rate(0.0).validate().is_err());
        assert!(DetectorConfig::default().with_usage_rate(1.5).validate().is_err());
        assert!(DetectorConfig::default()
            .with_periods(Duration::ZERO, Duration::from_secs(10))
            .validate()
            .is_err());
        assert!(DetectorConfig::default()
            .with_relative_change_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(DetectorConfig::default()
            .with_simulated_upsets(Some(2.0))
            .validate()
            .is_err());
    }
}
