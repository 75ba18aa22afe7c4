//! Pairing of concurrent request/response records.
//!
//! WARC writers usually store a `request` right next to the `response` it
//! produced, linked by `WARC-Concurrent-To`. The [`Correlator`] walks the
//! record stream with a single pending slot and, whenever two neighbours form
//! such a pair, threads the request's HTTP head (and optionally a POST/PUT
//! lookup key) into a [`CorrelationContext`] that travels with each record.
//!
//! Records come out in container order. When no correlation is needed the
//! correlator is a pass-through and never touches record content.

use std::collections::VecDeque;

use crate::archive::{read_bounded, ArchiveRecord, Headers, RecordSource, RecordType};
use crate::canonical::{canonicalize_or_original, Canonicalizer};
use crate::error::Result;
use crate::postquery::{is_body_method, PostQuery, DEFAULT_BODY_CAP};

/// HTTP request line data of a paired `request` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub headers: Headers,
}

/// Lookup key computed from a POST/PUT request body.
///
/// Both members of a pair carry the same `urlkey`; `method` and
/// `request_body` are only set on the response side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    pub urlkey: String,
    pub method: Option<String>,
    pub request_body: Option<String>,
}

/// Offset and length captured when the record was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPosition {
    pub offset: u64,
    pub length: u64,
}

/// Per-record pairing state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationContext {
    /// Head of the linked request, set on responses that were paired.
    pub request: Option<RequestHead>,
    pub derived: Option<DerivedKey>,
    /// Set whenever the record went through the pairing pass.
    pub position: Option<RecordPosition>,
}

/// A record on its way to the field extractor.
#[derive(Debug)]
pub struct IndexedRecord {
    pub record: ArchiveRecord,
    /// Buffered payload; `None` when the record was passed through unread.
    pub body: Option<Vec<u8>>,
    pub context: CorrelationContext,
}

impl IndexedRecord {
    /// Record with no pairing information and unread content.
    pub fn unpaired(record: ArchiveRecord) -> Self {
        Self {
            record,
            body: None,
            context: CorrelationContext::default(),
        }
    }
}

/// How much pairing work to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMode {
    /// Hand records through untouched.
    Bypass,
    /// Pair records; with `post_append`, also derive POST/PUT lookup keys.
    Pair { post_append: bool },
}

impl CorrelationMode {
    /// Pairing is needed for body enrichment or for any `req.http:` field.
    pub fn for_run(post_append: bool, needs_request_fields: bool) -> Self {
        if post_append || needs_request_fields {
            CorrelationMode::Pair { post_append }
        } else {
            CorrelationMode::Bypass
        }
    }
}

/// Single-pass request/response pairing over a [`RecordSource`].
pub struct Correlator<'a, S> {
    source: S,
    mode: CorrelationMode,
    canonicalizer: &'a dyn Canonicalizer,
    pending: Option<IndexedRecord>,
    ready: VecDeque<IndexedRecord>,
}

impl<'a, S: RecordSource> Correlator<'a, S> {
    pub fn new(source: S, mode: CorrelationMode, canonicalizer: &'a dyn Canonicalizer) -> Self {
        Self {
            source,
            mode,
            canonicalizer,
            pending: None,
            ready: VecDeque::new(),
        }
    }

    /// Next record in container order, or `None` at the end of the stream.
    pub fn next_record(&mut self) -> Result<Option<IndexedRecord>> {
        let post_append = match self.mode {
            CorrelationMode::Bypass => {
                return Ok(self.source.next_record()?.map(IndexedRecord::unpaired));
            }
            CorrelationMode::Pair { post_append } => post_append,
        };

        if let Some(record) = self.ready.pop_front() {
            return Ok(Some(record));
        }

        loop {
            let Some(record) = self.source.next_record()? else {
                return Ok(self.pending.take());
            };
            let mut incoming = buffer_record(record)?;

            let Some(mut previous) = self.pending.take() else {
                self.pending = Some(incoming);
                continue;
            };

            if is_concurrent_pair(&previous.record, &incoming.record) {
                self.join(&mut previous, &mut incoming, post_append);
                self.ready.push_back(incoming);
            } else {
                self.pending = Some(incoming);
            }
            return Ok(Some(previous));
        }
    }

    fn join(&self, first: &mut IndexedRecord, second: &mut IndexedRecord, post_append: bool) {
        let (req, resp) = if first.record.is_type(&RecordType::Request) {
            (first, second)
        } else {
            (second, first)
        };

        let Some(head) = req.record.http_headers.as_ref() else {
            tracing::debug!(
                record_id = req.record.record_id().unwrap_or("-"),
                "paired request has no HTTP head"
            );
            return;
        };
        let method = head.method().unwrap_or_default().to_string();
        resp.context.request = Some(RequestHead {
            method: method.clone(),
            headers: head.headers.clone(),
        });

        if !post_append || !is_body_method(&method) {
            return;
        }

        let body = req.body.as_deref().unwrap_or_default();
        let post = PostQuery::extract(
            &method,
            head.header("Content-Type"),
            head.header("Content-Length"),
            &mut &body[..],
        );
        let url = req.record.target_uri().unwrap_or_default();
        let urlkey = canonicalize_or_original(self.canonicalizer, &post.append_to(url));

        req.context.derived = Some(DerivedKey {
            urlkey: urlkey.clone(),
            method: None,
            request_body: None,
        });
        resp.context.derived = Some(DerivedKey {
            urlkey,
            method: Some(post.method),
            request_body: Some(post.query),
        });
    }
}

/// Capture the record position and, for requests, read the body into memory
/// (bounded by the declared length). Other records keep their content
/// stream.
fn buffer_record(mut record: ArchiveRecord) -> Result<IndexedRecord> {
    let body = if record.is_type(&RecordType::Request) {
        let limit = record.declared_length().unwrap_or(DEFAULT_BODY_CAP);
        Some(read_bounded(record.content_stream(), limit)?)
    } else {
        None
    };
    let position = RecordPosition {
        offset: record.offset,
        length: record.length,
    };
    Ok(IndexedRecord {
        record,
        body,
        context: CorrelationContext {
            position: Some(position),
            ..CorrelationContext::default()
        },
    })
}

/// Same target URI, `second` points at `first` via `WARC-Concurrent-To`, and
/// the two are one request and one response in either order.
fn is_concurrent_pair(first: &ArchiveRecord, second: &ArchiveRecord) -> bool {
    if first.target_uri() != second.target_uri() {
        return false;
    }
    match (second.concurrent_to(), first.record_id()) {
        (Some(reference), Some(id)) if reference == id => {}
        _ => return false,
    }
    matches!(
        (&first.rec_type, &second.rec_type),
        (RecordType::Request, RecordType::Response) | (RecordType::Response, RecordType::Request)
    )
}
