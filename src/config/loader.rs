//! Configuration discovery and producer path resolution.
//!
//! The first existing file wins: `./.pulsar-publisher.toml`, then
//! `<config_dir>/pulsar-publisher/config.toml`. An explicit `--config` path
//! replaces the search. The producer path is taken from `--bin`, then
//! `$PULSAR_PUBLISH_BIN`, then the file's `executable` key, then the copy
//! bundled with this program.

use std::path::{Path, PathBuf};

use super::PublisherConfig;
use crate::executable::{bundled_executable, env_executable};

const LOCAL_CONFIG: &str = ".pulsar-publisher.toml";
const APP_DIR: &str = "pulsar-publisher";
const CONFIG_FILE: &str = "config.toml";

/// Loads [`PublisherConfig`] and settles which producer executable to run.
#[derive(Debug)]
pub struct ConfigLoader {
    /// File given on the command line.
    file: Option<PathBuf>,
    /// Executable given on the command line.
    executable: Option<PathBuf>,
    /// Executable from the environment, captured at construction.
    env_executable: Option<PathBuf>,
}

impl ConfigLoader {
    /// Search the standard locations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: None,
            executable: None,
            env_executable: env_executable(),
        }
    }

    /// Read only `path`. A missing file still yields defaults.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: Some(path),
            ..Self::new()
        }
    }

    /// Producer path that overrides every other source.
    #[must_use]
    pub fn executable_override(mut self, path: Option<PathBuf>) -> Self {
        self.executable = path;
        self
    }

    fn candidates(&self) -> Vec<PathBuf> {
        if let Some(file) = &self.file {
            return vec![file.clone()];
        }
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        paths.extend(dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE)));
        paths
    }

    /// The config file that [`load`](Self::load) would read.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.candidates().into_iter().find(|path| path.is_file())
    }

    /// Load the configuration. The returned `executable` is always set.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<PublisherConfig, ConfigError> {
        let (mut config, origin) = match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                let config = read_config(&path)?;
                (config, path.parent().map(Path::to_path_buf))
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                (PublisherConfig::default(), None)
            }
        };

        let executable = self.resolve_executable(config.executable.take(), origin.as_deref());
        tracing::debug!(executable = %executable.display(), "Resolved producer executable");
        config.executable = Some(executable);
        Ok(config)
    }

    fn resolve_executable(&self, from_file: Option<PathBuf>, origin: Option<&Path>) -> PathBuf {
        if let Some(path) = self.executable.clone().or_else(|| self.env_executable.clone()) {
            return path;
        }
        match (from_file, origin) {
            // Relative to the file that named it.
            (Some(path), Some(dir)) if path.is_relative() => dir.join(path),
            (Some(path), _) => path,
            (None, _) => bundled_executable().to_path_buf(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_config(path: &Path) -> Result<PublisherConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors raised while loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
