//! Error types for the indexing pipeline.
//!
//! Only two kinds of failure ever leave the library:
//!
//! - [`ConfigError`] - invalid or conflicting options, raised before any
//!   input is touched
//! - [`IndexError`] - I/O problems at the input/output boundary, including a
//!   container whose record framing is broken
//!
//! Per-record problems (missing URL, undecodable request body, missing digest)
//! never surface here; they are handled where they occur with a fallback.

use std::path::PathBuf;

/// Invalid or unsatisfiable option combinations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Options {first} and {second} cannot be used together")]
    Conflict {
        first: &'static str,
        second: &'static str,
    },

    #[error("Block size must be at least 1 line (got: {0})")]
    ZeroBlockSize(usize),

    #[error("Empty field name in field list: {0:?}")]
    EmptyField(String),

    #[error("Empty record type in record list: {0:?}")]
    EmptyRecordType(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal errors at the input/output boundary.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open input {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at offset {offset}: {reason}")]
    Malformed { offset: u64, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IndexError {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        IndexError::Malformed {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
