//! Configuration for the pipeline logger and the bundled server.
//!
//! Everything has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [server]
//! addr = "127.0.0.1:8000"
//!
//! [pipeline]
//! level = "debug"
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use tracing::level_filters::LevelFilter;

/// Error raised while loading a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Where the bundled [`Server`](crate::Server) listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: SocketAddr::from(([0, 0, 0, 0], 3000)) }
    }
}

/// Per-pipeline settings.
///
/// `level` is the verbosity threshold of the pipeline's own log lines: chain
/// errors at `error`, per-request timing at `debug`. It is independent of the
/// global subscriber, so two pipelines in one process can log differently.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(deserialize_with = "deserialize_level")]
    pub level: LevelFilter,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { level: LevelFilter::INFO }
    }
}

impl PipelineConfig {
    pub fn with_level(level: LevelFilter) -> Self {
        Self { level }
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    LevelFilter::from_str(&raw).map_err(serde::de::Error::custom)
}
