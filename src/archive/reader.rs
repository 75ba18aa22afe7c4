//! WARC and ARC record framing for plain and per-record gzipped files.
//!
//! Each call to [`RecordSource::next_record`] reads one record: the
//! `WARC/1.x` version line, the header block, and `Content-Length` bytes of
//! block. Gzipped files are expected to hold one gzip member per record (the
//! standard `.warc.gz` layout); offsets and lengths then refer to the
//! compressed member so that index entries can seek straight to it.
//!
//! Legacy ARC records (a single space-separated header line followed by the
//! block) are mapped onto the same model: `filedesc://` records become
//! `warcinfo`, everything else `response`, and the URL, date and content type
//! of the header line become `WARC-Target-URI`, `WARC-Date` and
//! `Content-Type`.
//!
//! Blocks up to [`SPOOL_THRESHOLD`] bytes are held in memory. Larger blocks
//! keep their first [`HEAD_PEEK`] bytes in memory (enough for the HTTP head)
//! and spool the rest to an anonymous temporary file, so memory stays bounded
//! whatever the record size.
//!
//! Framing is all this reader does. Digests are not verified.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::bufread::GzDecoder;

use super::http::{split_http_head, HttpHead};
use super::{ArchiveRecord, Headers, RecordSource, RecordType};
use crate::error::{IndexError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Largest record block held fully in memory.
pub const SPOOL_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Leading bytes of a spooled block kept in memory.
pub const HEAD_PEEK: u64 = 64 * 1024;

/// Streaming reader over a WARC or ARC container.
pub struct WarcReader<R: BufRead> {
    inner: CountingReader<R>,
    /// Extra records decoded from a gzip member that held more than one.
    pending: VecDeque<ArchiveRecord>,
    spool_threshold: u64,
}

impl WarcReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IndexError::OpenInput {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: CountingReader::new(reader),
            pending: VecDeque::new(),
            spool_threshold: SPOOL_THRESHOLD,
        }
    }

    /// Spool blocks larger than `bytes` instead of [`SPOOL_THRESHOLD`].
    pub fn with_spool_threshold(mut self, bytes: u64) -> Self {
        self.spool_threshold = bytes;
        self
    }

    fn read_gzip_member(&mut self) -> Result<bool> {
        let offset = self.inner.position();
        let spool = self.spool_threshold;

        let mut records = Vec::new();
        let mut member = BufReader::new(GzDecoder::new(&mut self.inner));
        while let Some(record) = read_plain_record(&mut member, offset, spool).map_err(|e| match e {
            IndexError::Io(e) => IndexError::malformed(offset, format!("gzip member: {}", e)),
            other => other,
        })? {
            records.push(record);
        }
        drop(member);
        let length = self.inner.position() - offset;

        let count = records.len();
        self.pending
            .extend(records.into_iter().map(|r| r.with_position(offset, length)));
        if count > 1 {
            tracing::debug!(
                offset,
                count,
                "gzip member holds several records; they share one position"
            );
        }
        Ok(count > 0)
    }
}

impl<R: BufRead> RecordSource for WarcReader<R> {
    fn next_record(&mut self) -> Result<Option<ArchiveRecord>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }

            skip_line_breaks(&mut self.inner)?;
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }

            if buf[0] == GZIP_MAGIC[0] && (buf.len() < 2 || buf[1] == GZIP_MAGIC[1]) {
                // Empty members produce no record; keep going.
                self.read_gzip_member()?;
                continue;
            }

            let offset = self.inner.position();
            return match read_plain_record(&mut self.inner, offset, self.spool_threshold)? {
                Some(record) => {
                    skip_line_breaks(&mut self.inner)?;
                    let length = self.inner.position() - offset;
                    Ok(Some(record.with_position(offset, length)))
                }
                None => Ok(None),
            };
        }
    }
}

/// Parse one uncompressed record; `offset` only feeds error messages.
fn read_plain_record<B: BufRead>(
    src: &mut B,
    offset: u64,
    spool: u64,
) -> Result<Option<ArchiveRecord>> {
    skip_line_breaks(src)?;

    let mut line = String::new();
    if read_line_lossy(src, &mut line)? == 0 {
        return Ok(None);
    }

    let version = line.trim_end();
    if !version.starts_with("WARC/") {
        return match ArcHeader::parse(version) {
            Some(header) => read_arc_record(src, offset, header, spool).map(Some),
            None => {
                let preview: String = version.chars().take(40).collect();
                Err(IndexError::malformed(
                    offset,
                    format!(
                        "expected WARC version line or ARC header, found {:?}",
                        preview
                    ),
                ))
            }
        };
    }

    let mut headers = Headers::new();
    loop {
        line.clear();
        if read_line_lossy(src, &mut line)? == 0 {
            return Err(IndexError::malformed(offset, "unexpected end of headers"));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if trimmed.starts_with([' ', '\t']) {
            headers.append_continuation(trimmed.trim());
            continue;
        }
        match trimmed.split_once(':') {
            Some((name, value)) => headers.push(name.trim(), value.trim()),
            None => {
                return Err(IndexError::malformed(
                    offset,
                    format!("invalid header line {:?}", trimmed),
                ))
            }
        }
    }

    let length: u64 = headers
        .get("Content-Length")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| IndexError::malformed(offset, "missing or invalid Content-Length"))?;

    let rec_type = RecordType::from_tag(headers.get("WARC-Type").unwrap_or(""));
    let (http_headers, content) = read_content(src, offset, &rec_type, length, spool)?;

    Ok(Some(ArchiveRecord::new(
        rec_type,
        headers,
        http_headers,
        content,
    )))
}

/// Read a block of `length` bytes and split off its HTTP head.
fn read_content<B: BufRead>(
    src: &mut B,
    offset: u64,
    rec_type: &RecordType,
    length: u64,
    spool: u64,
) -> Result<(Option<HttpHead>, Box<dyn Read>)> {
    if length <= spool {
        let block = read_block(src, offset, length)?;
        let (head, payload) = split_http_head(rec_type, block);
        return Ok((head, Box::new(Cursor::new(payload))));
    }

    let peek = HEAD_PEEK.min(spool);
    let mut prefix = Vec::new();
    src.by_ref().take(peek).read_to_end(&mut prefix)?;

    let rest = length - prefix.len() as u64;
    let mut file = tempfile::tempfile()?;
    let copied = io::copy(&mut src.by_ref().take(rest), &mut file)?;
    let read = prefix.len() as u64 + copied;
    if read < length {
        return Err(IndexError::malformed(
            offset,
            format!("truncated block ({} of {} bytes)", read, length),
        ));
    }
    file.seek(SeekFrom::Start(0))?;
    tracing::debug!(offset, length, "spooled record block to a temporary file");

    let (head, payload) = split_http_head(rec_type, prefix);
    Ok((head, Box::new(Cursor::new(payload).chain(BufReader::new(file)))))
}

fn read_block<B: BufRead>(src: &mut B, offset: u64, length: u64) -> Result<Vec<u8>> {
    let mut block = Vec::new();
    src.by_ref().take(length).read_to_end(&mut block)?;
    if (block.len() as u64) < length {
        return Err(IndexError::malformed(
            offset,
            format!("truncated block ({} of {} bytes)", block.len(), length),
        ));
    }
    Ok(block)
}

// ============================================================================
// ARC
// ============================================================================

/// URL record line of an ARC file.
///
/// Version 1 lines carry `url ip date mime length`; version 2 lines add
/// status, checksum, location, offset and filename before the length.
#[derive(Debug, PartialEq, Eq)]
struct ArcHeader {
    url: String,
    date: String,
    mime: String,
    length: u64,
}

impl ArcHeader {
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 && fields.len() != 10 {
            return None;
        }
        let length = fields[fields.len() - 1].parse().ok()?;
        if !fields[0].contains("://") {
            return None;
        }
        Some(Self {
            url: fields[0].to_string(),
            date: fields[2].to_string(),
            mime: fields[3].to_string(),
            length,
        })
    }

    fn record_type(&self) -> RecordType {
        if self.url.starts_with("filedesc://") {
            RecordType::Warcinfo
        } else {
            RecordType::Response
        }
    }
}

fn read_arc_record<B: BufRead>(
    src: &mut B,
    offset: u64,
    header: ArcHeader,
    spool: u64,
) -> Result<ArchiveRecord> {
    let rec_type = header.record_type();
    let (http_headers, content) = read_content(src, offset, &rec_type, header.length, spool)?;

    let mut headers = Headers::new();
    headers.push("WARC-Type", rec_type.as_str());
    headers.push("WARC-Target-URI", header.url);
    headers.push("WARC-Date", arc_date_to_iso(&header.date));
    headers.push("Content-Type", header.mime);
    headers.push("Content-Length", header.length.to_string());

    Ok(ArchiveRecord::new(rec_type, headers, http_headers, content))
}

/// `20140216050221` as `2014-02-16T05:02:21Z`. Short dates are padded with
/// zeros; values that are not all digits are kept as they are.
fn arc_date_to_iso(date: &str) -> String {
    if date.is_empty() || !date.bytes().all(|b| b.is_ascii_digit()) {
        return date.to_string();
    }
    let mut digits: String = date.chars().take(14).collect();
    while digits.len() < 14 {
        digits.push('0');
    }
    format!(
        "{}-{}-{}T{}:{}:{}Z",
        &digits[0..4],
        &digits[4..6],
        &digits[6..8],
        &digits[8..10],
        &digits[10..12],
        &digits[12..14]
    )
}

fn read_line_lossy<B: BufRead>(src: &mut B, line: &mut String) -> io::Result<usize> {
    let mut raw = Vec::new();
    let n = src.read_until(b'\n', &mut raw)?;
    line.push_str(&String::from_utf8_lossy(&raw));
    Ok(n)
}

/// Consume the CRLF pairs separating records.
fn skip_line_breaks<B: BufRead>(src: &mut B) -> io::Result<()> {
    loop {
        let buf = src.fill_buf()?;
        let skip = buf.iter().take_while(|&&b| b == b'\r' || b == b'\n').count();
        if skip == 0 {
            return Ok(());
        }
        src.consume(skip);
    }
}

// ============================================================================
// Position Tracking
// ============================================================================

/// Buffered reader that knows how many bytes have been consumed.
struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    fn position(&self) -> u64 {
        self.position
    }
}

impl<R: BufRead> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CountingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.position += amt as u64;
        self.inner.consume(amt);
    }
}
