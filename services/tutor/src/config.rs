//! Application Configuration Module
//!
//! Loads the replay harness settings from environment variables into a single
//! struct that is handed to the pieces that need it.

use fluent_tutor_core::summarizer::DEFAULT_MODEL;
use secrecy::SecretString;
use std::env;
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` only when running offline with the canned summarizer.
    pub api_key: Option<SecretString>,
    pub summary_model: String,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Key for the summary model. `API_KEY` is accepted as a fallback. Required unless offline.
    // *   `SUMMARY_MODEL`: (Optional) Model used for session summaries. Defaults to "gemini-3-flash-preview".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO". Can be "TRACE", "DEBUG", "INFO", "WARN", or "ERROR".
    pub fn from_env(offline: bool) -> Result<Self, ConfigError> {
        // Load .env file. Ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(offline, |name| env::var(name).ok())
    }

    fn from_lookup<F>(offline: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);
        if api_key.is_none() && !offline {
            return Err(ConfigError::MissingVar(
                "GEMINI_API_KEY (or API_KEY) must be set unless running with --offline".to_string(),
            ));
        }

        let summary_model = lookup("SUMMARY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            api_key,
            summary_model,
            log_level,
        })
    }
}
