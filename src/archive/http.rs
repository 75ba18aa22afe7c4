//! HTTP head parsing for `response`, `request` and `revisit` blocks.
//!
//! The block of such a record is an HTTP message. Its start line and headers
//! are split off into an [`HttpHead`]; what remains is the payload.

use super::{Headers, RecordType};

/// Start line and headers of an archived HTTP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHead {
    /// `HTTP/1.1 200 OK` or `POST /path HTTP/1.1`
    pub start_line: String,
    pub headers: Headers,
}

impl HttpHead {
    pub fn new(start_line: impl Into<String>, headers: Headers) -> Self {
        Self {
            start_line: start_line.into(),
            headers,
        }
    }

    pub fn is_response(&self) -> bool {
        self.start_line.starts_with("HTTP/")
    }

    /// First token of the start line: the method of a request, the protocol
    /// of a response.
    pub fn protocol(&self) -> &str {
        self.start_line.split_whitespace().next().unwrap_or("")
    }

    /// Request method, `None` for responses.
    pub fn method(&self) -> Option<&str> {
        if self.is_response() {
            None
        } else {
            Some(self.protocol()).filter(|m| !m.is_empty())
        }
    }

    /// Status code of a response, `None` for requests.
    pub fn status_code(&self) -> Option<&str> {
        if !self.is_response() {
            return None;
        }
        self.start_line.split_whitespace().nth(1)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Split an HTTP head off a record block.
///
/// Returns `(None, block)` untouched when the record type never carries an
/// HTTP message or the block does not start with a plausible start line.
pub fn split_http_head(rec_type: &RecordType, block: Vec<u8>) -> (Option<HttpHead>, Vec<u8>) {
    if !rec_type.has_http_head() || !looks_like_start_line(rec_type, &block) {
        return (None, block);
    }

    let (head_len, body_start) = match find_head_end(&block) {
        Some(found) => found,
        // Revisit blocks often hold only the head, without the blank line.
        None => (block.len(), block.len()),
    };

    let head_text = String::from_utf8_lossy(&block[..head_len]);
    let mut lines = head_text.split('\n').map(|l| l.trim_end_matches('\r'));

    let start_line = lines.next().unwrap_or("").trim().to_string();
    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            headers.append_continuation(line.trim());
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push(name.trim(), value.trim());
        }
    }

    let payload = block[body_start..].to_vec();
    (Some(HttpHead::new(start_line, headers)), payload)
}

fn looks_like_start_line(rec_type: &RecordType, block: &[u8]) -> bool {
    let first_line_end = block
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(block.len());
    let line = String::from_utf8_lossy(&block[..first_line_end]);
    let line = line.trim();

    match rec_type {
        RecordType::Request => {
            let parts: Vec<&str> = line.split_whitespace().collect();
            parts.len() == 3 && parts[2].starts_with("HTTP/")
        }
        _ => line.starts_with("HTTP/"),
    }
}

/// Returns `(head length, payload start)`.
fn find_head_end(block: &[u8]) -> Option<(usize, usize)> {
    if let Some(pos) = find(block, b"\r\n\r\n") {
        return Some((pos, pos + 4));
    }
    find(block, b"\n\n").map(|pos| (pos, pos + 2))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
