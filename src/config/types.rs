//! Indexer option types and defaults

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::{OutputFormat, DEFAULT_BLOCK_LINES};

/// Everything that shapes one indexing run.
///
/// Loaded from TOML (every key optional) and then overridden by CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerOptions {
    /// Output line encoding
    pub format: OutputFormat,
    /// Extra fields appended to the default field list (comma-separated)
    pub fields: Option<String>,
    /// Field list replacing the defaults (comma-separated)
    pub replace_fields: Option<String>,
    /// Record types to index (comma-separated), or `all`
    pub records: Option<String>,
    /// Derive lookup keys from POST/PUT request bodies
    pub post_append: bool,
    /// Sort output lines and drop duplicates
    pub sort: bool,
    /// Write block-compressed index data to this path
    pub compress: Option<PathBuf>,
    /// Lines per compressed block
    pub lines: usize,
    /// Filename recorded in every entry instead of the input's own name
    pub filename: Option<String>,
    /// Record input filenames relative to this directory
    pub dir_root: Option<PathBuf>,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            fields: None,
            replace_fields: None,
            records: None,
            post_append: false,
            sort: false,
            compress: None,
            lines: default_lines(),
            filename: None,
            dir_root: None,
        }
    }
}

pub fn default_lines() -> usize {
    DEFAULT_BLOCK_LINES
}
