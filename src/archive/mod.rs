//! Archive record model and record sources.
//!
//! The indexer never looks at raw container bytes itself. Everything it needs
//! from an archive comes through the [`RecordSource`] trait, which hands out
//! [`ArchiveRecord`]s in file order.
//!
//! # Structure
//!
//! - `headers` - case-insensitive header mapping shared by WARC and HTTP heads
//! - `http` - splitting an HTTP head off a record block
//! - `reader` - [`WarcReader`], the default source for `.warc` / `.warc.gz`

mod headers;
pub mod http;
mod reader;

pub use headers::Headers;
pub use http::HttpHead;
pub use reader::WarcReader;

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Cursor, Read};

use crate::error::Result;

// ============================================================================
// Record Types
// ============================================================================

/// WARC record type tag (`WARC-Type` header).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    Warcinfo,
    Response,
    Resource,
    Request,
    Metadata,
    Revisit,
    Conversion,
    Continuation,
    /// Any tag outside the WARC/1.1 vocabulary, kept verbatim.
    Other(String),
}

impl RecordType {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "warcinfo" => RecordType::Warcinfo,
            "response" => RecordType::Response,
            "resource" => RecordType::Resource,
            "request" => RecordType::Request,
            "metadata" => RecordType::Metadata,
            "revisit" => RecordType::Revisit,
            "conversion" => RecordType::Conversion,
            "continuation" => RecordType::Continuation,
            other => RecordType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Warcinfo => "warcinfo",
            RecordType::Response => "response",
            RecordType::Resource => "resource",
            RecordType::Request => "request",
            RecordType::Metadata => "metadata",
            RecordType::Revisit => "revisit",
            RecordType::Conversion => "conversion",
            RecordType::Continuation => "continuation",
            RecordType::Other(tag) => tag,
        }
    }

    /// Whether records of this type carry an HTTP head in their block.
    pub fn has_http_head(&self) -> bool {
        matches!(
            self,
            RecordType::Response | RecordType::Request | RecordType::Revisit
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Archive Record
// ============================================================================

/// One record of an archive container.
///
/// `content` is the payload after any HTTP head. It can be read once; the
/// correlator buffers it when the same bytes are needed twice.
pub struct ArchiveRecord {
    pub rec_type: RecordType,
    pub rec_headers: Headers,
    pub http_headers: Option<HttpHead>,
    /// Byte offset of the record within its container.
    pub offset: u64,
    /// Encoded length of the record within its container.
    pub length: u64,
    content: Box<dyn Read>,
}

impl ArchiveRecord {
    pub fn new(
        rec_type: RecordType,
        rec_headers: Headers,
        http_headers: Option<HttpHead>,
        content: impl Read + 'static,
    ) -> Self {
        Self {
            rec_type,
            rec_headers,
            http_headers,
            offset: 0,
            length: 0,
            content: Box::new(content),
        }
    }

    /// Record built from an in-memory payload.
    pub fn from_bytes(
        rec_type: RecordType,
        rec_headers: Headers,
        http_headers: Option<HttpHead>,
        payload: Vec<u8>,
    ) -> Self {
        Self::new(rec_type, rec_headers, http_headers, Cursor::new(payload))
    }

    pub fn with_position(mut self, offset: u64, length: u64) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    pub fn content_stream(&mut self) -> &mut dyn Read {
        self.content.as_mut()
    }

    pub fn is_type(&self, rec_type: &RecordType) -> bool {
        &self.rec_type == rec_type
    }

    pub fn target_uri(&self) -> Option<&str> {
        self.rec_headers.get("WARC-Target-URI")
    }

    pub fn record_id(&self) -> Option<&str> {
        self.rec_headers.get("WARC-Record-ID")
    }

    pub fn concurrent_to(&self) -> Option<&str> {
        self.rec_headers.get("WARC-Concurrent-To")
    }

    pub fn date(&self) -> Option<&str> {
        self.rec_headers.get("WARC-Date")
    }

    /// Declared `Content-Length` of the record block, if parsable.
    pub fn declared_length(&self) -> Option<u64> {
        self.rec_headers
            .get("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }
}

impl fmt::Debug for ArchiveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveRecord")
            .field("rec_type", &self.rec_type)
            .field("rec_headers", &self.rec_headers)
            .field("http_headers", &self.http_headers)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Record Sources
// ============================================================================

/// Produces archive records in container order.
pub trait RecordSource {
    /// Next record, or `None` once the container is exhausted.
    fn next_record(&mut self) -> Result<Option<ArchiveRecord>>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> Result<Option<ArchiveRecord>> {
        (**self).next_record()
    }
}

/// Records already held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: VecDeque<ArchiveRecord>,
}

impl From<Vec<ArchiveRecord>> for MemorySource {
    fn from(records: Vec<ArchiveRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl RecordSource for MemorySource {
    fn next_record(&mut self) -> Result<Option<ArchiveRecord>> {
        Ok(self.records.pop_front())
    }
}

/// Read at most `limit` bytes, stopping quietly if the stream ends early.
pub fn read_bounded(stream: &mut dyn Read, limit: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    stream.take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}
