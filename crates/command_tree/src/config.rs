//! Typed configuration loading helpers.

use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use command_tree_contract::MessageCatalog;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The TOML body did not match the expected shape.
    #[error("failed to parse {origin}: {source}")]
    Parse {
        /// File path or `<inline>`.
        origin: String,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Generic TOML-backed config loader.
///
/// `ConfigLoader<T>` handles only filesystem access and TOML deserialization. Callers are still
/// responsible for semantic validation after the typed value is loaded.
#[derive(Clone, Debug)]
pub struct ConfigLoader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> ConfigLoader<T>
where
    T: DeserializeOwned,
{
    /// Create a loader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Load and deserialize the configuration file.
    pub fn load(&self) -> Result<T, ConfigError> {
        let body = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&body).map_err(|source| ConfigError::Parse {
            origin: self.path.display().to_string(),
            source,
        })
    }

    /// Return the config path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Subject element defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectConfig {
    /// Type assumed when a subject is given as a bare identifier.
    pub default_type: Option<String>,
}

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log every dispatch at info level.
    pub debug: bool,
    /// Subject element defaults.
    pub subjects: SubjectConfig,
    /// Translations for engine and handler messages.
    pub messages: MessageCatalog,
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        toml::from_str(body).map_err(|source| ConfigError::Parse {
            origin: "<inline>".to_string(),
            source,
        })
    }

    /// Loads a TOML file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        ConfigLoader::new(path).load()
    }
}
