use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bencode::DEFAULT_MAX_DEPTH;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "torinfo.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_file_size: u64,   // bytes; larger files are refused before reading
    pub max_depth: usize,     // nesting limit handed to the decoder
    pub pieces_sample: usize, // digests shown by `show` and `info`
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size: 16 * 1024 * 1024,
            max_depth: DEFAULT_MAX_DEPTH,
            pieces_sample: 3,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads `path`, or `torinfo.toml` when `path` is `None`.
    ///
    /// An explicit path must exist. The default path may be missing, in which
    /// case the defaults are used.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_path(Path::new(DEFAULT_CONFIG_PATH))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        anyhow::ensure!(config.max_depth > 0, "max_depth must be at least 1");
        Ok(config)
    }
}
