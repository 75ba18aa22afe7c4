//! Line encodings for index entries.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;

use crate::fields::IndexEntry;

/// Placeholder for missing columns in fixed-column formats.
pub const MISSING: &str = "-";

const CDX11_HEADER: &str = " CDX N b a m s k r M S V g";
const CDX09_HEADER: &str = " CDX N b a m s k r V g";

const CDX11_COLUMNS: &[&str] = &[
    "urlkey",
    "timestamp",
    "url",
    "mime",
    "status",
    "digest",
    "redirect",
    "meta",
    "length",
    "offset",
    "filename",
];

const CDX09_COLUMNS: &[&str] = &[
    "urlkey",
    "timestamp",
    "url",
    "mime",
    "status",
    "digest",
    "redirect",
    "offset",
    "filename",
];

/// Encoding of index lines, fixed for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `urlkey timestamp {json}`
    #[default]
    Cdxj,
    /// Legacy 11-column CDX.
    Cdx11,
    /// Legacy 9-column CDX.
    Cdx09,
}

impl OutputFormat {
    /// Header line written once at the top of the index, without newline.
    pub fn header(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Cdxj => None,
            OutputFormat::Cdx11 => Some(CDX11_HEADER),
            OutputFormat::Cdx09 => Some(CDX09_HEADER),
        }
    }

    /// Column names of fixed-column formats.
    pub fn columns(&self) -> Option<&'static [&'static str]> {
        match self {
            OutputFormat::Cdxj => None,
            OutputFormat::Cdx11 => Some(CDX11_COLUMNS),
            OutputFormat::Cdx09 => Some(CDX09_COLUMNS),
        }
    }

    /// Encode one entry as a line, including the trailing newline.
    pub fn encode(&self, urlkey: &str, timestamp: &str, entry: &IndexEntry) -> io::Result<String> {
        match self.columns() {
            None => Ok(format!("{} {} {}\n", urlkey, timestamp, to_cdxj_json(entry)?)),
            Some(columns) => {
                let values: Vec<&str> = columns
                    .iter()
                    .map(|&column| match column {
                        "urlkey" => urlkey,
                        "timestamp" => timestamp,
                        other => entry.get(other).unwrap_or(MISSING),
                    })
                    .collect();
                Ok(format!("{}\n", values.join(" ")))
            }
        }
    }
}

/// Serialize as JSON the way existing CDXJ indexes spell it:
/// `{"a": "b", "c": 1}` with every non-ASCII character `\u`-escaped.
pub fn to_cdxj_json<T: Serialize + ?Sized>(value: &T) -> io::Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, CdxjFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Compact JSON with `", "` / `": "` separators and ASCII-only strings.
struct CdxjFormatter;

impl Formatter for CdxjFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
