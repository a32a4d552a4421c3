//! TOML configuration file support.
//!
//! Settings shared by several commands can be kept in a config file instead
//! of being repeated on the command line:
//!
//! ```toml
//! # emstar.toml
//! [reader]
//! align = "projection"
//! extra_labels = ["rlnAutopickFigureOfMerit"]
//!
//! [assets]
//! output_dir = "Job042"
//! extension = "mrcs"
//! ```
//!
//! Command-line flags override values from the file.

use anyhow::{Context, Result};
use emstar::assets::AssetConfig;
use emstar::convert::ReaderConfig;
use serde::Deserialize;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "emstar.toml";

/// Root configuration structure for emstar.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Set reader settings.
    #[serde(default)]
    pub reader: ReaderConfig,

    /// Asset materialization settings.
    #[serde(default)]
    pub assets: AssetConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// The explicit file, else `emstar.toml` when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }
}
