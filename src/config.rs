//! Configuration management
//!
//! TOML-based configuration with per-section defaults. Resolution order: an
//! explicit `--config` path, then `~/.docscout/config.toml`, then built-in
//! defaults. Location: ~/.docscout/config.toml

use crate::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for docscout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub indexer: IndexerSettings,
    pub retrieval: RetrievalSettings,
    pub agent: AgentSettings,
    pub paths: PathsConfig,
}

/// Model gateway connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Indexer behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub batch_size: usize,
}

/// Retrieval behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub max_sections_per_document: usize,
}

/// Reasoning loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub max_repeats: usize,
}

/// Filesystem paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub documents_dir: String,
    pub indices_dir: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self { batch_size: 5 }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_sections_per_document: 5,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_repeats: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            documents_dir: "data/documents".to_string(),
            indices_dir: "data/indices".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse; the default location is
    /// optional and silently falls back to defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(EngineError::Config(format!(
                        "config file does not exist: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| EngineError::Config(format!("invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config location (`~/.docscout/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".docscout").join("config.toml"))
    }

    /// Sanity-check numeric settings
    pub fn validate(&self) -> Result<()> {
        if self.indexer.batch_size == 0 {
            return Err(EngineError::Config("indexer.batch_size must be > 0".to_string()));
        }
        if self.agent.max_iterations == 0 {
            return Err(EngineError::Config("agent.max_iterations must be > 0".to_string()));
        }
        if self.agent.max_repeats == 0 {
            return Err(EngineError::Config("agent.max_repeats must be > 0".to_string()));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(EngineError::Config("gateway.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.indexer.batch_size, 5);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.max_repeats, 3);
        assert_eq!(config.gateway.timeout_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gateway]
            model = "llama3.1:8b"

            [agent]
            max_iterations = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.model, "llama3.1:8b");
        assert_eq!(config.gateway.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.agent.max_iterations, 20);
        assert_eq!(config.agent.max_repeats, 3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config: Config = toml::from_str("[indexer]\nbatch_size = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 3").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retrieval.top_k, 3);
    }
}
