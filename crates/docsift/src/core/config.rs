//! Configuration loading and management.
//!
//! [`DocsiftConfig`] holds process-level settings that do not change per
//! request: network timeouts, recursion and size caps, and whether type hints
//! are trusted over sniffing. Per-request behavior is driven by the option set
//! instead (see [`crate::core::options`]).

use crate::types::resolve_output_encoding;
use crate::{DocsiftError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the file [`DocsiftConfig::discover`] looks for.
pub const CONFIG_FILE_NAME: &str = "docsift.toml";

/// Process-level configuration.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::DocsiftConfig;
///
/// let config = DocsiftConfig::default();
/// assert_eq!(config.max_embedding_depth, 16);
/// assert!(config.trust_content_type_hints);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsiftConfig {
    /// Timeouts and identity used by the network opener
    #[serde(default)]
    pub network: NetworkConfig,

    /// Maximum nesting depth for documents embedded in containers
    #[serde(default = "default_max_embedding_depth")]
    pub max_embedding_depth: usize,

    /// Inputs (and container members) larger than this are refused
    #[serde(default = "default_max_document_size")]
    pub max_document_size: u64,

    /// When true, a surviving content-type hint is returned without sniffing
    #[serde(default = "default_true")]
    pub trust_content_type_hints: bool,

    /// Encoding for text output when the request does not name one
    #[serde(default = "default_output_encoding")]
    pub default_output_encoding: String,
}

impl Default for DocsiftConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            max_embedding_depth: default_max_embedding_depth(),
            max_document_size: default_max_document_size(),
            trust_content_type_hints: true,
            default_output_encoding: default_output_encoding(),
        }
    }
}

/// Network opener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_embedding_depth() -> usize {
    16
}

fn default_max_document_size() -> u64 {
    512 * 1024 * 1024
}

fn default_output_encoding() -> String {
    "UTF-8".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("docsift/{}", env!("CARGO_PKG_VERSION"))
}

impl DocsiftConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, choosing the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(DocsiftError::validation(format!(
                "Unsupported config file format: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `docsift.toml` in the current directory and its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(DocsiftError::Io)?;
        Self::discover_from(&current)
    }

    /// Like [`discover`](Self::discover), starting from `start`.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Discovered configuration file");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.max_embedding_depth == 0 {
            return Err(DocsiftError::validation("max_embedding_depth must be at least 1"));
        }
        if self.max_document_size == 0 {
            return Err(DocsiftError::validation("max_document_size must be greater than 0"));
        }
        resolve_output_encoding(&self.default_output_encoding)?;
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| DocsiftError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = DocsiftConfig::default();
        assert_eq!(config.network.connect_timeout_secs, 30);
        assert_eq!(config.network.read_timeout_secs, 120);
        assert_eq!(config.max_document_size, 512 * 1024 * 1024);
        assert_eq!(config.default_output_encoding, "UTF-8");
        assert!(config.network.user_agent.starts_with("docsift/"));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.toml");

        fs::write(
            &config_path,
            r#"
max_embedding_depth = 4
trust_content_type_hints = false

[network]
connect_timeout_secs = 5
        "#,
        )
        .unwrap();

        let config = DocsiftConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.max_embedding_depth, 4);
        assert!(!config.trust_content_type_hints);
        assert_eq!(config.network.connect_timeout_secs, 5);
        assert_eq!(config.network.read_timeout_secs, 120);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.yaml");

        fs::write(&config_path, "default_output_encoding: ISO-8859-1\nmax_document_size: 1024\n").unwrap();

        let config = DocsiftConfig::from_file(&config_path).unwrap();
        assert_eq!(config.default_output_encoding, "ISO-8859-1");
        assert_eq!(config.max_document_size, 1024);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.json");

        fs::write(&config_path, r#"{"network": {"user_agent": "tests/1.0"}}"#).unwrap();

        let config = DocsiftConfig::from_file(&config_path).unwrap();
        assert_eq!(config.network.user_agent, "tests/1.0");
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.toml");
        fs::write(&config_path, "max_embedding_depth = \"deep\"").unwrap();

        let err = DocsiftConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, DocsiftError::Validation { .. }));
    }

    #[test]
    fn test_unknown_output_encoding_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.toml");
        fs::write(&config_path, "default_output_encoding = \"no-such-charset\"").unwrap();

        assert!(DocsiftConfig::from_toml_file(&config_path).is_err());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = DocsiftConfig {
            max_embedding_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = DocsiftConfig::from_file("config.ini").unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_discover_from_walks_parents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "max_embedding_depth = 3").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = DocsiftConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.max_embedding_depth, 3);
    }
}
