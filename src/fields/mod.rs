//! Field extraction for index entries.
//!
//! Each configured field is offered to an ordered chain of
//! [`FieldResolver`]s; the first one that handles the field decides its
//! value. Nothing in here fails: a field that cannot be resolved is simply
//! left out of the entry.
//!
//! # Structure
//!
//! - `config` - field list, defaults and the alias table
//! - `entry` - [`IndexEntry`], the ordered result
//! - `resolve` - resolver trait, the standard resolvers and the lazy digest

mod config;
mod entry;
mod resolve;

pub use config::{FieldAliases, FieldConfig, DEFAULT_FIELDS, REQUEST_FIELD_PREFIX};
pub use entry::IndexEntry;
pub use resolve::{
    default_chain, DigestResolver, FieldResolver, LazyDigest, PositionResolver, RawResolver,
    RequestResolver, Resolution, ResolveEnv, SyntheticResolver, UNKNOWN_MIME,
};

use crate::correlate::IndexedRecord;

/// Index key for the decoded POST/PUT body.
pub const REQUEST_BODY_KEY: &str = "requestBody";
/// Index key for the method of an enriched POST/PUT response.
pub const METHOD_KEY: &str = "method";

/// Resolves the configured fields of a record into an [`IndexEntry`].
pub struct FieldExtractor {
    config: FieldConfig,
    resolvers: Vec<Box<dyn FieldResolver>>,
    digests: LazyDigest,
}

impl FieldExtractor {
    pub fn new(config: FieldConfig) -> Self {
        Self::with_parts(config, default_chain(), LazyDigest::default())
    }

    pub fn with_parts(
        config: FieldConfig,
        resolvers: Vec<Box<dyn FieldResolver>>,
        digests: LazyDigest,
    ) -> Self {
        Self {
            config,
            resolvers,
            digests,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Value of one source field, or `None` when unresolved.
    pub fn resolve(
        &mut self,
        record: &mut IndexedRecord,
        field: &str,
        filename: &str,
    ) -> Option<String> {
        let mut env = ResolveEnv {
            filename,
            digests: &mut self.digests,
        };
        for resolver in &self.resolvers {
            match resolver.resolve(record, field, &mut env) {
                Resolution::Value(value) => return Some(value),
                Resolution::Absent => return None,
                Resolution::Unhandled => continue,
            }
        }
        None
    }

    /// Resolve every configured field, keyed by its output name, followed by
    /// the POST/PUT enrichment fields when the record carries them.
    pub fn extract(&mut self, record: &mut IndexedRecord, filename: &str) -> IndexEntry {
        let mut entry = IndexEntry::new();
        let fields = self.config.names().to_vec();
        for field in &fields {
            if let Some(value) = self.resolve(record, field, filename) {
                entry.insert(FieldAliases::output_name(field), value);
            }
        }

        if let Some(derived) = &record.context.derived {
            if let Some(body) = &derived.request_body {
                entry.insert(REQUEST_BODY_KEY, body.as_str());
            }
            if let Some(method) = &derived.method {
                entry.insert(METHOD_KEY, method.as_str());
            }
        }
        entry
    }

    /// Whether a digest ever had to be computed this run.
    pub fn computed_digests(&self) -> bool {
        self.digests.is_initialized()
    }
}
