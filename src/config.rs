use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codec::{GlyphError, Visual};

pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid glyph table: {0}")]
    Glyphs(#[from] GlyphError),
}

/// Runtime settings, read from a TOML file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Level catalog file. The built-in catalog is used when absent.
    pub levels: Option<PathBuf>,
    pub session_timeout_secs: u64,
    pub glyphs: Visual,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            levels: None,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            glyphs: Visual::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.glyphs.validate()?;
        Ok(config)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}
