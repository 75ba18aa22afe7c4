//! Configuration for indexing runs
//!
//! A run is described by one [`IndexerOptions`] value. The binary builds it
//! from an optional TOML file and lets CLI flags override the file.

pub mod docs;
mod io;
mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::fields::FieldConfig;
use crate::indexer::RecordFilter;
use crate::output::OutputFormat;

impl IndexerOptions {
    /// Get the default options file path (~/.config/cdxj-indexer/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        io::config_path()
    }

    /// Load options from `path`, or from the default file if it exists, or
    /// return defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        io::load(path)
    }

    /// Check that the options describe a runnable combination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let legacy_flag = match self.format {
            OutputFormat::Cdxj => None,
            OutputFormat::Cdx11 => Some("--cdx11"),
            OutputFormat::Cdx09 => Some("--cdx09"),
        };
        if let Some(first) = legacy_flag {
            if self.fields.is_some() {
                return Err(ConfigError::Conflict {
                    first,
                    second: "--fields",
                });
            }
            if self.replace_fields.is_some() {
                return Err(ConfigError::Conflict {
                    first,
                    second: "--replace-fields",
                });
            }
        }
        if self.lines == 0 {
            return Err(ConfigError::ZeroBlockSize(self.lines));
        }

        self.field_config()?;
        self.record_filter()?;
        Ok(())
    }

    pub fn field_config(&self) -> Result<FieldConfig, ConfigError> {
        FieldConfig::from_lists(self.fields.as_deref(), self.replace_fields.as_deref())
    }

    pub fn record_filter(&self) -> Result<RecordFilter, ConfigError> {
        RecordFilter::parse(self.records.as_deref())
    }

    /// `--compress` target with `.cdxj.gz` appended when it has no extension.
    pub fn compress_path(&self) -> Option<PathBuf> {
        self.compress.as_ref().map(|path| {
            if path.extension().is_some() {
                path.clone()
            } else {
                let mut name = path.clone().into_os_string();
                name.push(".cdxj.gz");
                PathBuf::from(name)
            }
        })
    }
}
