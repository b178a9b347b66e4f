use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use quill_cred::PreparatorConfig;

use crate::error::{RootError, RootResult};

/// Graph extensions that can be named in `[graph] extensions`. The base
/// primitives are always registered.
pub const KNOWN_EXTENSIONS: [&str; 2] = ["secp256k1", "mina"];

/// Which link sets make up the transformation graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphConfig {
    /// Extensions registered after the base primitives, in order.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    KNOWN_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

/// Top-level configuration for the quill binary.
///
/// Loaded from a TOML file (typically `~/.quill/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootConfig {
    /// Preparator behaviour.
    #[serde(default)]
    pub preparator: PreparatorConfig,

    /// Graph composition.
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(RootError::Io)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RootError::Io)?;
        }
        std::fs::write(path, contents).map_err(RootError::Io)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RootResult<()> {
        if self.preparator.default_schema_version.is_empty() {
            return Err(RootError::Config(
                "default_schema_version must not be empty".into(),
            ));
        }
        if self.preparator.max_depth == 0 {
            return Err(RootError::Config("max_depth must be > 0".into()));
        }
        for name in &self.graph.extensions {
            if !KNOWN_EXTENSIONS.contains(&name.as_str()) {
                return Err(RootError::Config(format!(
                    "unknown graph extension '{}' (known: {})",
                    name,
                    KNOWN_EXTENSIONS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".quill/config.toml")
    }
}
