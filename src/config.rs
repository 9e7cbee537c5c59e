// 7.0 config.rs: all settings in one place. module toggle and logging.
// 7.1 the toggle mirrors the investor module switch: disabled = both orchestrators no-op.

use serde::{Deserialize, Serialize};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    // Filter directives, e.g. "info" or "info,asset_transfer_core=debug"
    pub level: String,
    // Emit JSON lines instead of human readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    // Whether ownership transfers are processed at all
    pub enabled: bool,
    pub logging: LoggingConfig,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl TransferConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    // Verbose text logs for local runs
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config
    }

    // Quiet logs so test output stays readable
    pub fn test() -> Self {
        let mut config = Self::default();
        config.logging.level = "warn".to_string();
        config
    }

    // Structured logs for the batch cluster
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.json = true;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidLogLevel {
                level: self.logging.level.clone(),
            });
        }
        for directive in self.logging.level.split(',') {
            let level = directive.rsplit('=').next().unwrap_or(directive).trim();
            if !LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::InvalidLogLevel {
                    level: self.logging.level.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown log level directive: {level}")]
    InvalidLogLevel { level: String },
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn config(&self) -> TransferConfig {
        match self {
            Environment::Development => TransferConfig::development(),
            Environment::Test => TransferConfig::test(),
            Environment::Production => TransferConfig::production(),
        }
    }
}
