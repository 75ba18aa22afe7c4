//! Options file I/O

use std::fs;
use std::path::{Path, PathBuf};

use super::types::IndexerOptions;
use crate::error::ConfigError;

/// Get the config directory path (~/.config/cdxj-indexer)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("cdxj-indexer"))
}

/// Get the default config file path (~/.config/cdxj-indexer/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load options from an explicit file, or from the default location when it
/// exists, or fall back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<IndexerOptions, ConfigError> {
    if let Some(path) = explicit {
        return load_from(path);
    }
    match config_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(IndexerOptions::default()),
    }
}

/// Read and parse one options file.
pub fn load_from(path: &Path) -> Result<IndexerOptions, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let options: IndexerOptions = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded options file");
    Ok(options)
}
