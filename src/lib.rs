//! cdxj-indexer Library
//!
//! Builds CDXJ and legacy CDX lookup indexes for WARC web archives.
//!
//! ```no_run
//! use cdxj_indexer::output::PlainWriter;
//! use cdxj_indexer::{Indexer, IndexerOptions, Input};
//!
//! let mut indexer = Indexer::new(IndexerOptions::default())?;
//! let mut sink = PlainWriter::new(std::io::stdout());
//! indexer.run(vec![Input::from_arg("crawl.warc.gz")], &mut sink)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod canonical;
pub mod cli;
pub mod config;
pub mod correlate;
pub mod digest;
pub mod error;
pub mod fields;
pub mod indexer;
pub mod output;
pub mod postquery;
pub mod timestamp;

pub use archive::{ArchiveRecord, RecordSource, RecordType, WarcReader};
pub use canonical::{Canonicalizer, SurtCanonicalizer};
pub use config::IndexerOptions;
pub use digest::{DigestService, Sha1Digester};
pub use error::{ConfigError, IndexError};
pub use fields::{FieldExtractor, IndexEntry};
pub use indexer::{Indexer, Input, RecordFilter, RunSummary};
pub use output::{LineSink, OutputFormat};
