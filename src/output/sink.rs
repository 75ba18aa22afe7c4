//! Destinations for encoded index lines.
//!
//! Writers stack: the driver always talks to one [`LineSink`], which may be a
//! [`SortingWriter`] feeding a [`CompressingWriter`] feeding the output file.
//! Lines passed to a sink always end with `\n`.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use super::format::to_cdxj_json;

/// Default number of lines per compressed block.
pub const DEFAULT_BLOCK_LINES: usize = 300;

/// Format tag of the sidecar index written by [`CompressingWriter`].
pub const COMPRESSED_INDEX_FORMAT: &str = "cdxj-gzip-1.0";

#[derive(Serialize)]
struct SidecarMeta<'a> {
    format: &'a str,
    filename: &'a str,
}

#[derive(Serialize)]
struct BlockLocation {
    offset: u64,
    length: u64,
}

/// Receives complete index lines.
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush everything buffered. Called exactly once, after the last line.
    fn finish(&mut self) -> io::Result<()>;
}

impl<S: LineSink + ?Sized> LineSink for Box<S> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

// ============================================================================
// Plain
// ============================================================================

/// Writes lines straight through.
pub struct PlainWriter<W: Write> {
    out: W,
}

impl<W: Write> PlainWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LineSink for PlainWriter<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.out.write_all(line.as_bytes())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Buffers all lines, then writes them sorted with adjacent duplicates
/// dropped.
pub struct SortingWriter<S: LineSink> {
    inner: S,
    lines: Vec<String>,
}

impl<S: LineSink> SortingWriter<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lines: Vec::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: LineSink> LineSink for SortingWriter<S> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        let mut lines = std::mem::take(&mut self.lines);
        lines.sort_unstable();
        lines.dedup();
        for line in &lines {
            self.inner.write_line(line)?;
        }
        self.inner.finish()
    }
}

// ============================================================================
// Compressing
// ============================================================================

/// Splits lines into blocks of `block_lines`, gzips each block as its own
/// member into `data`, and writes one lookup line per block to `index`:
///
/// ```text
/// !meta 0 {"format": "cdxj-gzip-1.0", "filename": "index.cdxj.gz"}
/// com,example)/ 20170306040206 {"offset": 0, "length": 1834}
/// org,example)/ 20170306040348 {"offset": 1834, "length": 1790}
/// ```
///
/// Each lookup line carries the first line of its block up to the first `{`.
pub struct CompressingWriter<I: Write, D: Write> {
    index: I,
    data: D,
    data_name: String,
    block_lines: usize,
    block: Vec<String>,
    prefix: String,
    offset: u64,
    header_written: bool,
    blocks: usize,
}

impl<I: Write, D: Write> CompressingWriter<I, D> {
    /// `data_name` is recorded in the sidecar header; `block_lines` of zero
    /// is treated as one.
    pub fn new(index: I, data: D, data_name: impl Into<String>, block_lines: usize) -> Self {
        Self {
            index,
            data,
            data_name: data_name.into(),
            block_lines: block_lines.max(1),
            block: Vec::new(),
            prefix: String::new(),
            offset: 0,
            header_written: false,
            blocks: 0,
        }
    }

    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    pub fn into_parts(self) -> (I, D) {
        (self.index, self.data)
    }

    fn write_header(&mut self) -> io::Result<()> {
        let meta = SidecarMeta {
            format: COMPRESSED_INDEX_FORMAT,
            filename: &self.data_name,
        };
        writeln!(self.index, "!meta 0 {}", to_cdxj_json(&meta)?)?;
        self.header_written = true;
        Ok(())
    }

    fn flush_block(&mut self) -> io::Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for line in &self.block {
            encoder.write_all(line.as_bytes())?;
        }
        let compressed = encoder.finish()?;
        let length = compressed.len() as u64;

        self.data.write_all(&compressed)?;
        let location = BlockLocation {
            offset: self.offset,
            length,
        };
        writeln!(self.index, "{} {}", self.prefix, to_cdxj_json(&location)?)?;

        tracing::debug!(
            offset = self.offset,
            length,
            lines = self.block.len(),
            "wrote compressed block"
        );
        self.offset += length;
        self.blocks += 1;
        self.block.clear();
        Ok(())
    }
}

impl<I: Write, D: Write> LineSink for CompressingWriter<I, D> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.block.is_empty() {
            self.prefix = line
                .split_once('{')
                .map_or(line, |(before, _)| before)
                .trim()
                .to_string();
            if !self.header_written {
                self.write_header()?;
            }
        }

        self.block.push(line.to_string());
        if self.block.len() >= self.block_lines {
            self.flush_block()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.flush_block()?;
        self.data.flush()?;
        self.index.flush()
    }
}
