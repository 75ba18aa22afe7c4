//! The indexing driver.
//!
//! [`Indexer`] ties the pipeline together for one run:
//!
//! ```text
//! Input -> RecordSource -> Correlator -> RecordFilter -> FieldExtractor
//!       -> OutputFormat -> LineSink
//! ```
//!
//! Options are validated once when the indexer is built. After that the only
//! errors are I/O errors at the input/output boundary; problems with single
//! records are logged and the record is skipped or indexed with fallbacks.
//!
//! # Structure
//!
//! - `filter` - [`RecordFilter`], the record-type allowlist
//! - `input` - [`Input`], directory expansion and `filename` resolution

mod filter;
mod input;

pub use filter::{RecordFilter, DEFAULT_RECORDS, WARC_FIELDS_TYPE};
pub use input::{expand_inputs, resolve_filename, Input, ALLOWED_EXTENSIONS, STDIN_NAME};

use std::fs;
use std::io;
use std::path::PathBuf;

use humansize::{format_size, BINARY};

use crate::archive::{RecordSource, WarcReader};
use crate::canonical::{canonicalize_or_original, Canonicalizer, SurtCanonicalizer};
use crate::config::IndexerOptions;
use crate::correlate::{CorrelationMode, Correlator};
use crate::digest::DigestService;
use crate::error::{ConfigError, Result};
use crate::fields::{FieldExtractor, LazyDigest};
use crate::output::{LineSink, OutputFormat};
use crate::timestamp::iso_date_to_timestamp;

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inputs: usize,
    /// Size of the file inputs, in bytes.
    pub input_bytes: u64,
    pub records_read: usize,
    pub lines_written: usize,
    /// Records left out by the record-type filter.
    pub filtered: usize,
    /// Records with no URL to index under.
    pub without_url: usize,
}

/// Indexes record streams into a [`LineSink`].
pub struct Indexer {
    options: IndexerOptions,
    format: OutputFormat,
    filter: RecordFilter,
    mode: CorrelationMode,
    extractor: FieldExtractor,
    canonicalizer: Box<dyn Canonicalizer>,
    header_written: bool,
    summary: RunSummary,
}

impl Indexer {
    /// Validate `options` and set up the pipeline with the default
    /// canonicalizer and digest service.
    pub fn new(options: IndexerOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let fields = options.field_config()?;
        let mode = CorrelationMode::for_run(options.post_append, fields.needs_request());

        Ok(Self {
            format: options.format,
            filter: options.record_filter()?,
            mode,
            extractor: FieldExtractor::new(fields),
            canonicalizer: Box::new(SurtCanonicalizer),
            header_written: false,
            summary: RunSummary::default(),
            options,
        })
    }

    pub fn with_canonicalizer(mut self, canonicalizer: impl Canonicalizer + 'static) -> Self {
        self.canonicalizer = Box::new(canonicalizer);
        self
    }

    /// Use another digest service for records that lack a payload digest.
    /// It is only built if such a record shows up.
    pub fn with_digest_service(
        mut self,
        factory: impl Fn() -> Box<dyn DigestService> + 'static,
    ) -> Self {
        let config = self.extractor.config().clone();
        self.extractor = FieldExtractor::with_parts(
            config,
            crate::fields::default_chain(),
            LazyDigest::new(factory),
        );
        self
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Index every input (directories expanded) and finish the sink.
    pub fn run(&mut self, inputs: Vec<Input>, sink: &mut dyn LineSink) -> Result<RunSummary> {
        for input in expand_inputs(inputs)? {
            self.index_input(input, sink)?;
        }
        self.write_header(sink)?;
        sink.finish()?;

        let summary = self.summary.clone();
        tracing::info!(
            inputs = summary.inputs,
            input_size = %format_size(summary.input_bytes, BINARY),
            records = summary.records_read,
            lines = summary.lines_written,
            filtered = summary.filtered,
            without_url = summary.without_url,
            "indexing finished"
        );
        Ok(summary)
    }

    /// Index one input without finishing the sink.
    pub fn index_input(&mut self, input: Input, sink: &mut dyn LineSink) -> Result<()> {
        match input {
            Input::Path(path) => {
                let filename = resolve_filename(
                    &path,
                    self.options.filename.as_deref(),
                    self.options.dir_root.as_deref(),
                );
                if let Ok(meta) = fs::metadata(&path) {
                    self.summary.input_bytes += meta.len();
                }
                tracing::debug!(path = %path.display(), filename = %filename, "indexing input");
                let reader = WarcReader::open(&path)?;
                self.index_source(reader, &filename, sink)
            }
            Input::Stdin => {
                let filename = self
                    .options
                    .filename
                    .clone()
                    .unwrap_or_else(|| STDIN_NAME.to_string());
                let reader = WarcReader::new(io::stdin().lock());
                self.index_source(reader, &filename, sink)
            }
            Input::Reader { name, reader } => {
                let filename = match &self.options.filename {
                    Some(forced) => forced.clone(),
                    None => resolve_filename(&PathBuf::from(&name), None, None),
                };
                self.index_source(WarcReader::new(reader), &filename, sink)
            }
        }
    }

    /// Index all records of `source`, recording `filename` in each entry.
    pub fn index_source<S: RecordSource>(
        &mut self,
        source: S,
        filename: &str,
        sink: &mut dyn LineSink,
    ) -> Result<()> {
        self.write_header(sink)?;
        self.summary.inputs += 1;

        let mut correlator = Correlator::new(source, self.mode, self.canonicalizer.as_ref());
        while let Some(mut indexed) = correlator.next_record()? {
            self.summary.records_read += 1;

            if !self.filter.admits(&indexed.record) {
                self.summary.filtered += 1;
                continue;
            }

            let entry = self.extractor.extract(&mut indexed, filename);

            let url = entry
                .get("url")
                .or_else(|| indexed.record.target_uri())
                .filter(|url| !url.is_empty());
            let Some(url) = url else {
                tracing::debug!(
                    rec_type = %indexed.record.rec_type,
                    offset = indexed.record.offset,
                    "record has no URL; skipping"
                );
                self.summary.without_url += 1;
                continue;
            };

            let urlkey = match &indexed.context.derived {
                Some(derived) => derived.urlkey.clone(),
                None => canonicalize_or_original(self.canonicalizer.as_ref(), url),
            };
            let timestamp = iso_date_to_timestamp(indexed.record.date().unwrap_or_default());

            let line = self.format.encode(&urlkey, &timestamp, &entry)?;
            sink.write_line(&line)?;
            self.summary.lines_written += 1;
        }
        Ok(())
    }

    fn write_header(&mut self, sink: &mut dyn LineSink) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        if let Some(header) = self.format.header() {
            sink.write_line(&format!("{}\n", header))?;
        }
        Ok(())
    }
}
