/// Extract `(name, value)` pairs from a `multipart/*` body.
///
/// `content_type` is the full header value, e.g.
/// `multipart/form-data; boundary=----abc`. Returns `None` when no boundary is
/// declared or the body holds no delimiter, so the caller can fall back to
/// the binary encoding. Parts without a `name` are skipped.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> Option<Vec<(String, String)>> {
    let boundary = boundary_param(content_type)?;
    let delimiter = format!("--{}", boundary).into_bytes();

    let mut sections = split_on(body, &delimiter);
    if sections.len() < 2 {
        return None;
    }
    // Preamble before the first delimiter.
    sections.remove(0);

    let mut pairs = Vec::new();
    for section in sections {
        if section.starts_with(b"--") {
            break;
        }
        let section = strip_leading_newline(section);
        let (head, value) = match find(section, b"\r\n\r\n") {
            Some(idx) => (&section[..idx], &section[idx + 4..]),
            None => match find(section, b"\n\n") {
                Some(idx) => (&section[..idx], &section[idx + 2..]),
                None => continue,
            },
        };
        let value = strip_trailing_newline(value);

        let head = String::from_utf8_lossy(head);
        let Some(name) = part_name(&head) else {
            continue;
        };
        pairs.push((name, String::from_utf8_lossy(value).into_owned()));
    }

    Some(pairs)
}

fn boundary_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// `name` parameter of the part's `Content-Disposition` header.
fn part_name(head: &str) -> Option<String> {
    let disposition = head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("content-disposition")
            .then_some(value)
    })?;

    disposition.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("name")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(idx) = find(rest, needle) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + needle.len()..];
    }
    parts.push(rest);
    parts
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn strip_leading_newline(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n")
        .or_else(|| data.strip_prefix(b"\n"))
        .unwrap_or(data)
}

fn strip_trailing_newline(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n")
        .or_else(|| data.strip_suffix(b"\n"))
        .unwrap_or(data)
}
