use std::fmt;

use crate::archive::RecordType;
use crate::correlate::IndexedRecord;
use crate::digest::{strip_algorithm, DigestService, Sha1Digester};

use super::config::REQUEST_FIELD_PREFIX;

/// Default value of `mime` when no content type is known.
pub const UNKNOWN_MIME: &str = "unk";

const PAYLOAD_DIGEST: &str = "warc-payload-digest";

/// Outcome of asking one resolver for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The field resolved to a value.
    Value(String),
    /// The resolver owns this field but the record has no value for it.
    Absent,
    /// Not this resolver's field; ask the next one.
    Unhandled,
}

impl Resolution {
    fn from_option(value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => Resolution::Value(v.into()),
            None => Resolution::Absent,
        }
    }
}

/// Run-wide state the resolvers share.
pub struct ResolveEnv<'a> {
    /// Name the current input is indexed under.
    pub filename: &'a str,
    pub digests: &'a mut LazyDigest,
}

/// One link of the resolver chain.
pub trait FieldResolver {
    fn resolve(
        &self,
        record: &mut IndexedRecord,
        field: &str,
        env: &mut ResolveEnv<'_>,
    ) -> Resolution;
}

/// Digest service built on first use and kept for the rest of the run.
pub struct LazyDigest {
    factory: Box<dyn Fn() -> Box<dyn DigestService>>,
    service: Option<Box<dyn DigestService>>,
}

impl LazyDigest {
    pub fn new(factory: impl Fn() -> Box<dyn DigestService> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            service: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.service.is_some()
    }

    fn get(&mut self) -> &mut dyn DigestService {
        let factory = &self.factory;
        self.service.get_or_insert_with(|| factory()).as_mut()
    }
}

impl Default for LazyDigest {
    fn default() -> Self {
        Self::new(|| Box::new(Sha1Digester::new()))
    }
}

impl fmt::Debug for LazyDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDigest")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Resolvers
// ============================================================================

/// `mime` and `filename`, which are computed rather than looked up.
pub struct SyntheticResolver;

impl FieldResolver for SyntheticResolver {
    fn resolve(
        &self,
        indexed: &mut IndexedRecord,
        field: &str,
        env: &mut ResolveEnv<'_>,
    ) -> Resolution {
        match field {
            "mime" => Resolution::Value(mime_of(indexed)),
            "filename" => Resolution::Value(env.filename.to_string()),
            _ => Resolution::Unhandled,
        }
    }
}

fn mime_of(indexed: &IndexedRecord) -> String {
    let record = &indexed.record;
    let raw = match record.rec_type {
        RecordType::Revisit => return "warc/revisit".to_string(),
        RecordType::Response | RecordType::Request => record
            .http_headers
            .as_ref()
            .and_then(|h| h.header("Content-Type")),
        _ => record.rec_headers.get("Content-Type"),
    };

    raw.and_then(|value| value.trim().split([';', ' ', '\t', '\r', '\n']).next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_MIME)
        .to_string()
}

/// `offset` / `length` as captured by the pairing pass.
pub struct PositionResolver;

impl FieldResolver for PositionResolver {
    fn resolve(
        &self,
        indexed: &mut IndexedRecord,
        field: &str,
        _env: &mut ResolveEnv<'_>,
    ) -> Resolution {
        let Some(position) = indexed.context.position else {
            return Resolution::Unhandled;
        };
        match field {
            "offset" => Resolution::Value(position.offset.to_string()),
            "length" => Resolution::Value(position.length.to_string()),
            _ => Resolution::Unhandled,
        }
    }
}

/// `req.http:method` and `req.http:<header>` from the linked request, or
/// from the record itself when it is a request.
pub struct RequestResolver;

impl FieldResolver for RequestResolver {
    fn resolve(
        &self,
        indexed: &mut IndexedRecord,
        field: &str,
        _env: &mut ResolveEnv<'_>,
    ) -> Resolution {
        let Some(name) = field.strip_prefix(REQUEST_FIELD_PREFIX) else {
            return Resolution::Unhandled;
        };

        if let Some(request) = &indexed.context.request {
            let value = if name == "method" {
                Some(request.method.as_str())
            } else {
                request.headers.get(name)
            };
            return Resolution::from_option(value);
        }

        let record = &indexed.record;
        if !record.is_type(&RecordType::Request) {
            return Resolution::Absent;
        }
        let Some(head) = record.http_headers.as_ref() else {
            return Resolution::Absent;
        };
        let value = if name == "method" {
            head.method()
        } else {
            head.header(name)
        };
        Resolution::from_option(value)
    }
}

/// `warc-payload-digest`, computed and cached on the record when missing.
pub struct DigestResolver;

impl FieldResolver for DigestResolver {
    fn resolve(
        &self,
        indexed: &mut IndexedRecord,
        field: &str,
        env: &mut ResolveEnv<'_>,
    ) -> Resolution {
        if !field.eq_ignore_ascii_case(PAYLOAD_DIGEST) {
            return Resolution::Unhandled;
        }

        if let Some(value) = indexed.record.rec_headers.get(PAYLOAD_DIGEST) {
            return Resolution::Value(strip_algorithm(value).to_string());
        }

        let service = env.digests.get();
        let computed = match indexed.body.as_deref() {
            Some(body) => service.payload_digest(&mut &body[..]),
            None => service.payload_digest(indexed.record.content_stream()),
        };
        match computed {
            Ok(value) => {
                let stripped = strip_algorithm(&value).to_string();
                indexed.record.rec_headers.set("WARC-Payload-Digest", value);
                Resolution::Value(stripped)
            }
            Err(e) => {
                tracing::debug!(
                    record_id = indexed.record.record_id().unwrap_or("-"),
                    "Failed to compute payload digest: {}",
                    e
                );
                Resolution::Absent
            }
        }
    }
}

/// Direct lookups: `http:status`, `http:<header>`, record position, and
/// any WARC header by name. Last in the chain; never unhandled.
pub struct RawResolver;

impl FieldResolver for RawResolver {
    fn resolve(
        &self,
        indexed: &mut IndexedRecord,
        field: &str,
        _env: &mut ResolveEnv<'_>,
    ) -> Resolution {
        let record = &indexed.record;
        let value = match field {
            "offset" => Some(record.offset.to_string()),
            "length" => Some(record.length.to_string()),
            "http:status" => match record.rec_type {
                RecordType::Response | RecordType::Revisit => record
                    .http_headers
                    .as_ref()
                    .and_then(|h| h.status_code())
                    .map(str::to_string),
                _ => None,
            },
            _ => match field.strip_prefix("http:") {
                Some(name) => record
                    .http_headers
                    .as_ref()
                    .and_then(|h| h.header(name))
                    .map(str::to_string),
                None => record.rec_headers.get(field).map(str::to_string),
            },
        };
        Resolution::from_option(value)
    }
}

/// The standard chain, in priority order.
pub fn default_chain() -> Vec<Box<dyn FieldResolver>> {
    vec![
        Box::new(SyntheticResolver),
        Box::new(PositionResolver),
        Box::new(RequestResolver),
        Box::new(DigestResolver),
        Box::new(RawResolver),
    ]
}
