//! Payload digests for records that were written without one.

use std::io::{self, Read};

use data_encoding::BASE32;
use sha1::{Digest, Sha1};

/// Computes a payload digest in `<algorithm>:<value>` form.
pub trait DigestService {
    fn payload_digest(&mut self, payload: &mut dyn Read) -> io::Result<String>;
}

/// `sha1:<BASE32>` digests, the form WARC writers use for
/// `WARC-Payload-Digest`.
#[derive(Debug, Default)]
pub struct Sha1Digester {
    buf: Vec<u8>,
}

impl Sha1Digester {
    pub fn new() -> Self {
        Self {
            buf: vec![0; 16 * 1024],
        }
    }
}

impl DigestService for Sha1Digester {
    fn payload_digest(&mut self, payload: &mut dyn Read) -> io::Result<String> {
        if self.buf.is_empty() {
            self.buf.resize(16 * 1024, 0);
        }

        let mut hasher = Sha1::new();
        loop {
            let n = match payload.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&self.buf[..n]);
        }

        Ok(format!("sha1:{}", BASE32.encode(&hasher.finalize())))
    }
}

/// Drop the `algorithm:` prefix of a digest value.
pub fn strip_algorithm(value: &str) -> &str {
    match value.split_once(':') {
        Some((_, digest)) => digest,
        None => value,
    }
}
