//! Application configuration loaded from TOML
//!
//! ```toml
//! [registry]
//! path = "data/latex_conversion.json"
//!
//! [model]
//! weights = "data/stroke_classifier.bin"
//! hidden_size = 128
//! num_layers = 2
//! bidirectional = true
//! num_classes = 10
//!
//! [toolchain]
//! output_dir = "latex_file"
//! compiler = "latexmk"
//! viewer = "code"
//! timeout_ms = 60000
//! ```
//!
//! Every section and key is optional. Relative paths are resolved against
//! the directory containing the configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::classifier::ModelConfig;
use crate::document::{DocumentConfig, ToolchainConfig};

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Symbol registry JSON file
    pub path: PathBuf,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/latex_conversion.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Persisted parameter blob
    pub weights: PathBuf,

    #[serde(flatten)]
    pub architecture: ModelConfig,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            weights: PathBuf::from("data/stroke_classifier.bin"),
            architecture: ModelConfig::default(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistrySection,
    pub model: ModelSection,
    pub document: DocumentConfig,
    pub toolchain: ToolchainConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, resolving relative paths
    /// against the file's directory
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_str(&content)?;
        Ok(match path.parent() {
            Some(base) => config.with_base_path(base),
            None => config,
        })
    }

    /// Load configuration from a TOML string; paths are kept as written
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the symbol registry file
    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry.path = path.into();
        self
    }

    /// Set the parameter blob and the architecture it must match
    pub fn with_model(mut self, weights: impl Into<PathBuf>, architecture: ModelConfig) -> Self {
        self.model.weights = weights.into();
        self.model.architecture = architecture;
        self
    }

    /// Set the document templates
    pub fn with_document(mut self, document: DocumentConfig) -> Self {
        self.document = document;
        self
    }

    /// Set the output location and external tools
    pub fn with_toolchain(mut self, toolchain: ToolchainConfig) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Resolve every relative path against `base`
    pub fn with_base_path(mut self, base: &Path) -> Self {
        self.registry.path = resolve_path(base, &self.registry.path);
        self.model.weights = resolve_path(base, &self.model.weights);
        self.toolchain.output_dir = resolve_path(base, &self.toolchain.output_dir);
        self
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
