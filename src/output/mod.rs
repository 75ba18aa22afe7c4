//! Index line encoding and writing.
//!
//! # Structure
//!
//! - `format` - [`OutputFormat`]: CDXJ, CDX 11-column and CDX 9-column lines
//! - `sink` - [`LineSink`] writers: plain, sorting, block-compressing

pub mod format;
pub mod sink;

pub use format::{to_cdxj_json, OutputFormat};
pub use sink::{
    CompressingWriter, LineSink, PlainWriter, SortingWriter, COMPRESSED_INDEX_FORMAT,
    DEFAULT_BLOCK_LINES,
};
