//! FileChunk configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Split defaults
    pub split: SplitConfig,

    /// Report output
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise the first readable candidate from
    /// [`Config::candidate_paths`] wins, and broken candidates are skipped.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths().into_iter().filter(|p| p.exists()) {
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %candidate.display(), "Skipping config: {:#}", e),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// `./.filechunk.yml`, then `<config_dir>/filechunk/filechunk.yml`
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".filechunk.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("filechunk").join("filechunk.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Log file location: `<data_local_dir>/filechunk/logs/filechunk.log`
pub fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filechunk")
        .join("logs")
        .join("filechunk.log")
}

/// Split defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Chunk size in MB when `--size` is not given (0 = no default)
    #[serde(rename = "default-size-mb")]
    pub default_size_mb: u64,

    /// Parent directory for chunk groups (default: next to the source file)
    #[serde(rename = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

/// Report output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}
