//! Content-encoding negotiation.
//!
//! Only gzip is understood. Every other Accept-Encoding token, `identity`
//! included, is ignored.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::http::response::Response;

/// Encodings the server can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
        }
    }

    /// Exact, case-sensitive token match.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "gzip" => Some(ContentEncoding::Gzip),
            _ => None,
        }
    }

    pub fn encode(&self, body: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            ContentEncoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
        }
    }
}

/// First supported encoding among the accepted tokens, in header order.
pub fn negotiate<S: AsRef<str>>(accepted: &[S]) -> Option<ContentEncoding> {
    accepted
        .iter()
        .find_map(|token| ContentEncoding::from_token(token.as_ref()))
}

/// Compress the response body when the client accepts a supported encoding.
///
/// Empty bodies are left alone. If compression fails the response goes out
/// uncompressed.
pub fn encode_response<S: AsRef<str>>(resp: &mut Response, accepted: &[S]) {
    if resp.body.is_empty() {
        return;
    }
    let Some(encoding) = negotiate(accepted) else {
        return;
    };

    match encoding.encode(&resp.body) {
        Ok(compressed) => {
            resp.content_length = Some(compressed.len());
            resp.body = compressed;
            resp.content_encoding = Some(encoding.as_str().to_string());
        }
        Err(e) => {
            tracing::warn!(
                encoding = encoding.as_str(),
                error = %e,
                "Compression failed, sending body uncompressed"
            );
        }
    }
}
