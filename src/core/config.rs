use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::engine::operations::Reduction;

pub const DEFAULT_CONFIG_PATH: &str = "cosdist.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable
    #[default]
    Display,
    /// Machine-readable TOON
    Toon,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "display" => Ok(OutputFormat::Display),
            "toon" => Ok(OutputFormat::Toon),
            other => Err(format!("Unknown output format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossSection {
    pub reduction: Reduction,
    pub axis: i64,
}

impl Default for LossSection {
    fn default() -> Self {
        Self {
            reduction: Reduction::default(),
            axis: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
}

/// Contents of `cosdist.toml`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    pub loss: LossSection,
    pub output: OutputSection,
}

impl LossConfig {
    /// Loads `./cosdist.toml`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", DEFAULT_CONFIG_PATH, e);
                Self::default()
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
