//! URL canonicalization into sort-friendly index keys.
//!
//! Index lines are keyed by a SURT-style form of the captured URL, so that
//! all captures of a host sort together and trivially different spellings of
//! the same URL share one key:
//!
//! ```text
//! http://www.Example.com:80/Path?b=2&a=1#top  ->  com,example)/path?a=1&b=2
//! ```
//!
//! Canonicalization is a best-effort aid. [`canonicalize_or_original`] falls
//! back to the original URL whenever a canonicalizer refuses an input.

use url::{Host, Url};

/// Why a URL could not be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot canonicalize {url:?}: {reason}")]
pub struct CanonicalizeError {
    pub url: String,
    pub reason: String,
}

impl CanonicalizeError {
    fn new(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Reduces a URL to its index key.
pub trait Canonicalizer {
    fn canonicalize(&self, url: &str) -> Result<String, CanonicalizeError>;
}

/// Canonicalize, or hand back the URL unchanged if that fails.
pub fn canonicalize_or_original(canonicalizer: &dyn Canonicalizer, url: &str) -> String {
    match canonicalizer.canonicalize(url) {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!("{}; using the URL as key", e);
            url.to_string()
        }
    }
}

/// SURT (Sort-friendly URI Reordering Transform) canonicalizer.
///
/// - scheme, userinfo and fragment are dropped
/// - host is lowercased, a leading `www.` / `wwwN.` label is removed and the
///   remaining labels are reversed and comma-joined; IP addresses stay as-is
/// - non-default ports are kept as `:port`
/// - path and query are lowercased and query parameters are sorted
#[derive(Debug, Clone, Copy, Default)]
pub struct SurtCanonicalizer;

impl Canonicalizer for SurtCanonicalizer {
    fn canonicalize(&self, url: &str) -> Result<String, CanonicalizeError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(CanonicalizeError::new(url, "empty URL"));
        }

        let parsed = Url::parse(trimmed).map_err(|e| CanonicalizeError::new(url, e.to_string()))?;

        let host = match parsed.host() {
            Some(Host::Domain(domain)) => reverse_domain(domain),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => format!("[{}]", addr),
            None => return Err(CanonicalizeError::new(url, "URL has no host")),
        };
        if host.is_empty() {
            return Err(CanonicalizeError::new(url, "URL has an empty host"));
        }

        let mut key = host;
        if let Some(port) = parsed.port() {
            key.push(':');
            key.push_str(&port.to_string());
        }
        key.push(')');

        let path = parsed.path();
        if path.is_empty() {
            key.push('/');
        } else {
            key.push_str(&path.to_lowercase());
        }

        if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
            key.push('?');
            key.push_str(&sort_query(&query.to_lowercase()));
        }

        Ok(key)
    }
}

fn reverse_domain(domain: &str) -> String {
    let domain = domain.trim_end_matches('.').to_lowercase();
    let mut labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();

    if labels.len() > 1 && is_www_label(labels[0]) {
        labels.remove(0);
    }

    labels.reverse();
    labels.join(",")
}

/// `www`, `www1`, `www2`, ...
fn is_www_label(label: &str) -> bool {
    label
        .strip_prefix("www")
        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
}

fn sort_query(query: &str) -> String {
    let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    params.sort_unstable();
    params.join("&")
}
