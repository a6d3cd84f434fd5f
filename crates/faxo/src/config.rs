//! Delivery configuration.
//!
//! Controls the simulated transmission timing and outcome probabilities.
//! Loaded from a JSON file or built from [`DeliveryConfig::default`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning knobs for the transmission simulation and notification feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConfig {
    /// Seconds between submission and the first resolution attempt.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Seconds between a retry and its resolution attempt.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Probability that the first attempt ends in delivery.
    #[serde(default = "default_first_attempt_success")]
    pub first_attempt_success: f64,

    /// Probability that a retry attempt ends in delivery.
    #[serde(default = "default_retry_success")]
    pub retry_success: f64,

    /// Fraction of failures classified as line errors rather than
    /// transmission failures.
    #[serde(default = "default_line_error_ratio")]
    pub line_error_ratio: f64,

    /// Rolling window, in hours, for the recent notification count.
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: i64,

    /// Capacity of the fax event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Seconds a resolved user account stays cached.
    #[serde(default = "default_identity_ttl_secs")]
    pub identity_ttl_secs: u64,

    /// Pattern accepted counterparty numbers must match.
    #[serde(default = "default_number_pattern")]
    pub number_pattern: String,
}

fn default_initial_delay_secs() -> u64 {
    30
}

fn default_retry_delay_secs() -> u64 {
    20
}

fn default_first_attempt_success() -> f64 {
    0.7
}

fn default_retry_success() -> f64 {
    0.8
}

fn default_line_error_ratio() -> f64 {
    0.33
}

fn default_recent_window_hours() -> i64 {
    24
}

fn default_event_capacity() -> usize {
    100
}

fn default_identity_ttl_secs() -> u64 {
    60
}

fn default_number_pattern() -> String {
    r"^\+?[0-9().\-\s]{4,20}$".to_string()
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            first_attempt_success: default_first_attempt_success(),
            retry_success: default_retry_success(),
            line_error_ratio: default_line_error_ratio(),
            recent_window_hours: default_recent_window_hours(),
            event_capacity: default_event_capacity(),
            identity_ttl_secs: default_identity_ttl_secs(),
            number_pattern: default_number_pattern(),
        }
    }
}

impl DeliveryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Delay before resolution for the given attempt number. The first
    /// attempt uses the longer initial delay, retries resolve faster.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            self.initial_delay()
        } else {
            self.retry_delay()
        }
    }

    /// Success probability for the given attempt number.
    pub fn success_probability(&self, attempt: u32) -> f64 {
        if attempt <= 1 {
            self.first_attempt_success
        } else {
            self.retry_success
        }
    }
}

/// Loads a delivery config from a JSON file.
pub fn load_config(path: &Path) -> Result<DeliveryConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a delivery config from a JSON string.
pub fn load_config_from_str(content: &str) -> Result<DeliveryConfig, ConfigError> {
    let config: DeliveryConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_probability(value: f64, name: &str) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation {
            message: format!("{} must be between 0.0 and 1.0, got {}", name, value),
        });
    }
    Ok(())
}

/// Validates config fields beyond what serde enforces.
pub fn validate_config(config: &DeliveryConfig) -> Result<(), ConfigError> {
    validate_probability(config.first_attempt_success, "firstAttemptSuccess")?;
    validate_probability(config.retry_success, "retrySuccess")?;
    validate_probability(config.line_error_ratio, "lineErrorRatio")?;

    if config.recent_window_hours < 1 {
        return Err(ConfigError::Validation {
            message: format!(
                "recentWindowHours must be at least 1, got {}",
                config.recent_window_hours
            ),
        });
    }

    if config.event_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "eventCapacity must be at least 1".to_string(),
        });
    }

    if let Err(e) = regex::Regex::new(&config.number_pattern) {
        return Err(ConfigError::Validation {
            message: format!("numberPattern is not a valid regex: {}", e),
        });
    }

    Ok(())
}
