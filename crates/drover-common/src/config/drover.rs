//! Drover configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DroverError, DroverResult};

/// Main Drover configuration.
///
/// # Example
///
/// ```rust
/// use drover_common::config::DroverConfig;
///
/// let config = DroverConfig::default();
/// assert_eq!(config.compiler.default_parallelism, 1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DroverConfig {
    /// Stage compiler configuration.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Job launcher configuration.
    #[serde(default)]
    pub launcher: LauncherConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DroverConfig {
    /// Creates a configuration tuned for tests: a short poll interval.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            launcher: LauncherConfig {
                poll_interval_ms: 5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> DroverResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> DroverResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| DroverError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> DroverResult<String> {
        toml::to_string_pretty(self).map_err(|e| DroverError::config(e.to_string()))
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> DroverResult<()> {
        if self.launcher.poll_interval_ms == 0 {
            return Err(DroverError::config("launcher.poll_interval_ms must be positive"));
        }

        if !(0.0..0.5).contains(&self.launcher.completion_tolerance) {
            return Err(DroverError::config(
                "launcher.completion_tolerance must be in [0, 0.5)",
            ));
        }

        if self.compiler.default_parallelism == 0 {
            return Err(DroverError::config(
                "compiler.default_parallelism must be at least 1",
            ));
        }

        Ok(())
    }

    /// Sets the launcher poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.launcher.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the progress weighting policy.
    #[must_use]
    pub fn with_progress_weighting(mut self, weighting: ProgressWeighting) -> Self {
        self.launcher.progress_weighting = weighting;
        self
    }

    /// Sets the default parallelism of redistribution stages.
    #[must_use]
    pub fn with_default_parallelism(mut self, parallelism: usize) -> Self {
        self.compiler.default_parallelism = parallelism;
        self
    }
}

/// Stage compiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Parallelism of a redistribution stage whose boundary operator
    /// requests none.
    /// Default: 1
    pub default_parallelism: usize,

    /// Insert a quantile sampling stage in front of every total-order sort.
    /// Default: true
    pub sample_total_order_sort: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_parallelism: 1,
            sample_total_order_sort: true,
        }
    }
}

/// How the launcher weighs each job when aggregating progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressWeighting {
    /// Every job weighs 1/N.
    #[default]
    Equal,
    /// Jobs weigh proportionally to their task parallelism.
    Parallelism,
}

/// Job launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Fixed interval between progress polls, in milliseconds.
    /// Default: 500
    pub poll_interval_ms: u64,

    /// Weighting used to aggregate per-job progress.
    /// Default: equal
    pub progress_weighting: ProgressWeighting,

    /// Distance from 1.0 under which progress counts as complete.
    /// Default: 1e-6
    pub completion_tolerance: f64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            progress_weighting: ProgressWeighting::Equal,
            completion_tolerance: 1e-6,
        }
    }
}

impl LauncherConfig {
    /// Returns the poll interval as a duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns true if `progress` counts as full completion.
    #[must_use]
    pub fn is_complete(&self, progress: f64) -> bool {
        (1.0 - progress).abs() <= self.completion_tolerance
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace).
    /// Default: info
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = DroverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.launcher.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.launcher.progress_weighting, ProgressWeighting::Equal);
        assert!(config.compiler.sample_total_order_sort);
    }

    #[test]
    fn test_invalid_poll_interval() {
        let config = DroverConfig::default().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_parallelism() {
        let config = DroverConfig::default().with_default_parallelism(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_complete() {
        let launcher = LauncherConfig::default();
        assert!(launcher.is_complete(1.0));
        assert!(launcher.is_complete(0.999_999_9));
        assert!(!launcher.is_complete(0.5));
        assert!(!launcher.is_complete(0.0));
    }

    #[test]
    fn test_partial_toml() {
        let config = DroverConfig::from_toml(
            r#"
            [launcher]
            poll_interval_ms = 100
            progress_weighting = "parallelism"
            "#,
        )
        .unwrap();
        assert_eq!(config.launcher.poll_interval_ms, 100);
        assert_eq!(
            config.launcher.progress_weighting,
            ProgressWeighting::Parallelism
        );
        assert_eq!(config.compiler, CompilerConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_rejects_invalid() {
        let err = DroverConfig::from_toml("[compiler]\ndefault_parallelism = 0\n").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drover.toml");
        let config = DroverConfig::for_testing().with_default_parallelism(4);
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = DroverConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
