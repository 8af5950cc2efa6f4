//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults so a partial (or empty) file is valid.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::pipeline::PipelineOptions;

/// Default location of the fitted model artifact.
pub const DEFAULT_MODEL_PATH: &str = "assets/mlbx_model.json";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub pipeline: PipelineOptions,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Path of the JSON model artifact, loaded once per process.
    pub artifact_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: DEFAULT_MODEL_PATH.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub port: u16,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_upload_bytes: 2 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        anyhow::ensure!(
            config.pipeline.histogram_bins > 0,
            "pipeline.histogram_bins must be at least 1"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeaderStyle;

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory; absent in some
        // test environments.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert_eq!(cfg.model.artifact_path, DEFAULT_MODEL_PATH);
            assert_eq!(cfg.pipeline.top_parlay_size, 3);
            assert!(cfg.dashboard.port > 0);
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.model.artifact_path, DEFAULT_MODEL_PATH);
        assert_eq!(cfg.pipeline, PipelineOptions::default());
        assert_eq!(cfg.dashboard.port, 8080);
    }

    #[test]
    fn test_partial_pipeline_section() {
        let cfg = AppConfig::from_toml(
            r#"
            [pipeline]
            header_style = "dashboard"
            derive_prediction_from_probability = true
            include_roi = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.pipeline.header_style, HeaderStyle::Dashboard);
        assert!(cfg.pipeline.derive_prediction_from_probability);
        assert!(!cfg.pipeline.include_roi);
        assert!(cfg.pipeline.include_prop_parlay);
        assert_eq!(cfg.pipeline.top_parlay_size, 3);
    }

    #[test]
    fn test_rejects_unknown_header_style() {
        assert!(AppConfig::from_toml("[pipeline]\nheader_style = \"shouting\"\n").is_err());
    }

    #[test]
    fn test_rejects_zero_bins() {
        assert!(AppConfig::from_toml("[pipeline]\nhistogram_bins = 0\n").is_err());
    }
}
