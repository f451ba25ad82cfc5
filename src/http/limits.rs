//! Size limits applied while reading and parsing a request.
//!
//! # Design Decisions
//! - Every boundary truncates deterministically; nothing is rejected for size
//! - Limits are plain values copied into the parser, no shared state

use serde::{Deserialize, Serialize};

/// Maximum bytes read from a connection for one request.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

/// Maximum request body or served file length.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2048;

/// Maximum length of any single request field (target, host, one encoding token...).
pub const DEFAULT_MAX_FIELD_BYTES: usize = 1024;

/// Maximum number of Accept-Encoding tokens kept.
pub const DEFAULT_MAX_ENCODINGS: usize = 16;

/// Truncation boundaries for the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    pub max_frame_bytes: usize,
    pub max_body_bytes: usize,
    pub max_field_bytes: usize,
    pub max_encodings: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_field_bytes: DEFAULT_MAX_FIELD_BYTES,
            max_encodings: DEFAULT_MAX_ENCODINGS,
        }
    }
}

/// Copy at most `max` bytes of `value`. Bytes are kept as received, so a cut
/// may fall inside a multi-byte character.
pub fn truncate_field(value: &[u8], max: usize) -> Vec<u8> {
    value[..value.len().min(max)].to_vec()
}
