// Demo configuration: TOML file, defaults, and a validation pass.

use crate::error::ConfigError;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const MAX_CALLERS: usize = 64;
pub const MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoConfig {
    pub strategies: Vec<Strategy>,
    pub callers: usize,
    pub delay_ms: u64,
    /// Cancel the construction delay after this many milliseconds.
    pub cancel_after_ms: Option<u64>,
    pub output: OutputFormat,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            strategies: Strategy::ALL.to_vec(),
            callers: 3,
            delay_ms: 100,
            cancel_after_ms: None,
            output: OutputFormat::Text,
        }
    }
}

/// On-disk shape of [`DemoConfig`]. Strategy names are parsed afterwards,
/// so a bad name is reported as [`ConfigError::UnknownStrategy`] rather
/// than a TOML error.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    strategies: Vec<String>,
    callers: usize,
    delay_ms: u64,
    cancel_after_ms: Option<u64>,
    output: OutputFormat,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = DemoConfig::default();
        Self {
            strategies: defaults.strategies.iter().map(ToString::to_string).collect(),
            callers: defaults.callers,
            delay_ms: defaults.delay_ms,
            cancel_after_ms: defaults.cancel_after_ms,
            output: defaults.output,
        }
    }
}

impl ConfigFile {
    fn into_config(self) -> Result<DemoConfig, ConfigError> {
        let strategies = self
            .strategies
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Strategy>, _>>()?;

        Ok(DemoConfig {
            strategies,
            callers: self.callers,
            delay_ms: self.delay_ms,
            cancel_after_ms: self.cancel_after_ms,
            output: self.output,
        })
    }
}

impl DemoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let config = file.into_config()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::invalid("strategies", "at least one strategy is required"));
        }

        for (i, strategy) in self.strategies.iter().enumerate() {
            if self.strategies[..i].contains(strategy) {
                return Err(ConfigError::invalid(
                    "strategies",
                    format!("'{}' is listed more than once", strategy),
                ));
            }
        }

        if !(1..=MAX_CALLERS).contains(&self.callers) {
            return Err(ConfigError::invalid(
                "callers",
                format!("must be between 1 and {}, got {}", MAX_CALLERS, self.callers),
            ));
        }

        if self.delay_ms > MAX_DELAY_MS {
            return Err(ConfigError::invalid(
                "delay_ms",
                format!("must be at most {}, got {}", MAX_DELAY_MS, self.delay_ms),
            ));
        }

        if let Some(after) = self.cancel_after_ms {
            if after > MAX_DELAY_MS {
                return Err(ConfigError::invalid(
                    "cancel_after_ms",
                    format!("must be at most {}, got {}", MAX_DELAY_MS, after),
                ));
            }
        }

        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn cancel_after(&self) -> Option<Duration> {
        self.cancel_after_ms.map(Duration::from_millis)
    }
}
