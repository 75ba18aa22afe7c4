//! Request body decoding for POST/PUT lookup keys.
//!
//! Two POST requests to the same URL are different resources if their bodies
//! differ. To index them apart, the request body is turned into a bounded,
//! url-encoded query string and appended to the URL before canonicalization:
//!
//! ```text
//! POST http://httpbin.org/post   body: foo=bar&test=abc
//!   -> http://httpbin.org/post?__wb_method=POST&foo=bar&test=abc
//!   -> org,httpbin)/post?__wb_method=post&foo=bar&test=abc
//! ```
//!
//! # Structure
//!
//! - `json` - flattening of JSON bodies into key/value pairs
//! - `multipart` - `multipart/form-data` part extraction

mod json;
mod multipart;

pub use json::{json_flatten, FlattenError};
pub use multipart::parse_multipart;

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::archive::read_bounded;

/// Bytes read when the request has no usable `Content-Length`.
pub const DEFAULT_BODY_CAP: u64 = 8192;

/// Longest query string ever produced, in characters.
pub const MAX_QUERY_CHARS: usize = 4096;

/// Key wrapping bodies that cannot be decoded as text.
pub const POST_DATA_KEY: &str = "__wb_post_data";

/// Key carrying the HTTP method in the lookup query.
pub const METHOD_KEY: &str = "__wb_method";

/// Characters escaped in query keys and values: everything except ASCII
/// alphanumerics and `_.-~`. Spaces become `+` separately.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Decoded request body of one POST/PUT request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Upper-case HTTP method.
    pub method: String,
    /// Url-encoded, truncated body representation.
    pub query: String,
}

impl PostQuery {
    pub fn extract(
        method: &str,
        content_type: Option<&str>,
        declared_length: Option<&str>,
        stream: &mut dyn Read,
    ) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            query: query_extract(content_type, declared_length, stream),
        }
    }

    /// `?__wb_method=POST&<query>`, or `&...` when `url` already has a query.
    pub fn url_suffix(&self, url: &str) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}={}&{}", sep, METHOD_KEY, self.method, self.query)
    }

    pub fn append_to(&self, url: &str) -> String {
        format!("{}{}", url, self.url_suffix(url))
    }
}

/// Whether bodies of this method take part in lookup keys.
pub fn is_body_method(method: &str) -> bool {
    method.eq_ignore_ascii_case("POST") || method.eq_ignore_ascii_case("PUT")
}

/// Decode a request body into a query string.
///
/// Reads at most `declared_length` bytes ([`DEFAULT_BODY_CAP`] when missing
/// or unparsable) and picks a decoding by content type:
///
/// | content type                         | result                                   |
/// |--------------------------------------|------------------------------------------|
/// | `application/x-www-form-urlencoded`  | percent-decoded body                     |
/// | `multipart/*`                        | url-encoded `name=value` of each part    |
/// | `application/json`                   | url-encoded flattened leaves, `""` on error |
/// | `text/plain`                         | as JSON, raw fallback on error           |
/// | anything else                        | `__wb_post_data=<base64>`                |
///
/// The result never exceeds [`MAX_QUERY_CHARS`] characters.
pub fn query_extract(
    content_type: Option<&str>,
    declared_length: Option<&str>,
    stream: &mut dyn Read,
) -> String {
    let limit = declared_length
        .and_then(|len| len.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_BODY_CAP);

    let raw = match read_bounded(stream, limit) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            Vec::new()
        }
    };

    let mime = content_type.unwrap_or("").trim().to_ascii_lowercase();

    let query = if mime.starts_with("application/x-www-form-urlencoded") {
        decode_form(&raw).unwrap_or_else(|| encode_binary(&raw))
    } else if mime.starts_with("multipart/") {
        match parse_multipart(content_type.unwrap_or(""), &raw) {
            Some(pairs) => urlencode(&pairs),
            None => encode_binary(&raw),
        }
    } else if mime.starts_with("application/json") {
        match json_flatten(&String::from_utf8_lossy(&raw)) {
            Ok(pairs) => urlencode(&pairs),
            Err(e) => {
                tracing::warn!("Failed to decode JSON request body: {}", e);
                String::new()
            }
        }
    } else if mime.starts_with("text/plain") {
        let flattened = std::str::from_utf8(&raw)
            .ok()
            .and_then(|text| json_flatten(text).ok());
        match flattened {
            Some(pairs) => urlencode(&pairs),
            None => encode_binary(&raw),
        }
    } else {
        encode_binary(&raw)
    };

    truncate_chars(query, MAX_QUERY_CHARS)
}

/// `None` only when the raw body is not UTF-8. Escapes that decode to
/// invalid UTF-8 become U+FFFD.
fn decode_form(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let spaced = text.replace('+', " ");
    Some(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}

fn encode_binary(raw: &[u8]) -> String {
    format!("{}={}", POST_DATA_KEY, STANDARD.encode(raw))
}

/// `k=v&k=v` with each side escaped by [`quote_plus`].
fn urlencode(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", quote_plus(k), quote_plus(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode for a query string, spaces as `+`.
fn quote_plus(text: &str) -> String {
    text.split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
    text
}
