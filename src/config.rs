//! Configuration management for the credit scoring API

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the ONNX artifacts and preprocessor manifest
    pub models_dir: String,
    /// Logistic regression artifact file name
    #[serde(default = "default_lr_file")]
    pub logistic_regression_file: String,
    /// Random forest artifact file name
    #[serde(default = "default_rf_file")]
    pub random_forest_file: String,
    /// Fitted preprocessing manifest file name
    #[serde(default = "default_preprocessor_file")]
    pub preprocessor_file: String,
    /// Version string reported for the logistic regression model
    #[serde(default = "default_model_version")]
    pub lr_version: String,
    /// Version string reported for the random forest model
    #[serde(default = "default_model_version")]
    pub rf_version: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_lr_file() -> String {
    "credit_scoring_lr.onnx".to_string()
}

fn default_rf_file() -> String {
    "credit_scoring_rf.onnx".to_string()
}

fn default_preprocessor_file() -> String {
    "preprocessor.json".to_string()
}

fn default_model_version() -> String {
    "1.0".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Probability cutoff converting a score to a binary label
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                logistic_regression_file: default_lr_file(),
                random_forest_file: default_rf_file(),
                preprocessor_file: default_preprocessor_file(),
                lr_version: default_model_version(),
                rf_version: default_model_version(),
                onnx_threads: 1,
            },
            scoring: ScoringConfig {
                threshold: default_threshold(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.scoring.threshold, 0.5);
        assert_eq!(config.models.logistic_regression_file, "credit_scoring_lr.onnx");
        assert_eq!(config.models.random_forest_file, "credit_scoring_rf.onnx");
        assert_eq!(config.models.onnx_threads, 1);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(AppConfig::load_from_path("config/does_not_exist.toml").is_err());
    }
}
