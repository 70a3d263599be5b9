use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TabulaError};

/// Top-level configuration for the Tabula engine.
///
/// Loaded from `tabula.toml` by default. Each section corresponds to one
/// subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabulaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl TabulaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TabulaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TabulaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Port for the HTTP API.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            log_level: "info".to_string(),
        }
    }
}

/// Analysis pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A categorical column gets its own chart only when its cardinality is
    /// at most this many distinct values.
    pub max_categories: usize,
    /// Cap on the number of numeric histograms in the chart battery.
    pub max_histograms: usize,
    /// Minimum numeric column count before a correlation heatmap is added.
    pub min_numeric_for_correlation: usize,
    /// Default histogram bin count.
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_categories: 15,
            max_histograms: 4,
            min_numeric_for_correlation: 2,
            histogram_bins: 30,
        }
    }
}

/// Language-model collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// When false, the engine runs fully deterministic (no narrative layer,
    /// keyword-only intent classification).
    pub enabled: bool,
    /// Base URL of the completion endpoint.
    pub api_base: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Hard timeout applied to every collaborator call.
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Chat query router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Queries longer than this are rejected before routing.
    pub max_query_len: usize,
    /// How many trailing conversation messages feed the LLM prompt.
    pub history_context: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_query_len: 500,
            history_context: 3,
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle longer than this are swept. Explicit cleanup remains
    /// the primary path.
    pub idle_ttl_minutes: u64,
    /// Interval between idle sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: 60,
            sweep_interval_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = TabulaConfig::default();
        assert_eq!(config.general.port, 8000);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.analysis.max_categories, 15);
        assert_eq!(config.analysis.min_numeric_for_correlation, 2);
        assert_eq!(config.chat.history_context, 3);
        assert_eq!(config.session.idle_ttl_minutes, 60);
        assert!(!config.llm.enabled);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = TabulaConfig::load_or_default(Path::new("/nonexistent/tabula.toml"));
        assert_eq!(config.general.port, 8000);
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
            [general]
            port = 9001

            [analysis]
            max_categories = 10
        "#;
        let config: TabulaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.port, 9001);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.analysis.max_categories, 10);
        assert_eq!(config.analysis.histogram_bins, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabula.toml");

        let mut config = TabulaConfig::default();
        config.general.port = 9100;
        config.save(&path).unwrap();

        let reloaded = TabulaConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.port, 9100);
        assert_eq!(reloaded.analysis.max_categories, 15);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabula.toml");
        std::fs::write(&path, "general = [[[").unwrap();

        let result = TabulaConfig::load(&path);
        assert!(matches!(result, Err(TabulaError::Config(_))));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = TabulaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: TabulaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.general.log_level, config.general.log_level);
        assert_eq!(deserialized.llm.timeout_ms, config.llm.timeout_ms);
    }
}
