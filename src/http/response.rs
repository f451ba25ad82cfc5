//! Response model and wire formatting.
//!
//! # Responsibilities
//! - Hold the status, optional headers and body produced by a route
//! - Serialize a response into the exact bytes sent to the client
//!
//! # Design Decisions
//! - Optional headers are omitted entirely when unset, never sent empty
//! - Header order is fixed: Content-Encoding, Content-Type, Content-Length
//! - The body is written as raw bytes; embedded NULs are preserved
//! - Formatting is pure: the same response always yields the same bytes

use std::fmt;

use thiserror::Error;

/// Version used when the request did not supply a usable one.
pub const DEFAULT_HTTP_VERSION: &str = "HTTP/1.1";

/// Status codes this server produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    Created,
    NotFound,
    InternalServerError,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

/// Reasons a response cannot be serialized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// No route assigned a status.
    #[error("response status was never set")]
    StatusUnset,

    /// Declared Content-Length disagrees with the body.
    #[error("content length {declared} does not match body length {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Bytes sent when a response cannot be formatted.
pub const INTERNAL_ERROR_RESPONSE: &[u8] = b"HTTP/1.1 500 Internal Server Error\r\n\r\n";

/// An outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub http_version: String,
    pub status: Option<StatusCode>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    /// `None` means no Content-Length header is emitted.
    pub content_length: Option<usize>,
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            http_version: DEFAULT_HTTP_VERSION.to_string(),
            status: None,
            content_type: None,
            content_encoding: None,
            content_length: None,
            body: Vec::new(),
        }
    }
}

impl Response {
    /// A bodiless response with the given status.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn not_found() -> Self {
        Self::with_status(StatusCode::NotFound)
    }

    /// Set the body and keep Content-Length in step with it.
    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.content_type = Some(content_type.to_string());
        self.content_length = Some(body.len());
        self.body = body;
        self
    }

    /// Use the request's version when it looks like one.
    pub fn with_version(mut self, version: &str) -> Self {
        if version.starts_with("HTTP/") {
            self.http_version = version.to_string();
        }
        self
    }

    /// Serialize to wire bytes: status line, set headers, blank line, body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let status = self.status.ok_or(FormatError::StatusUnset)?;
        if let Some(declared) = self.content_length {
            if declared != self.body.len() {
                return Err(FormatError::LengthMismatch {
                    declared,
                    actual: self.body.len(),
                });
            }
        }

        let mut head = format!("{} {}\r\n", self.http_version, status);
        if let Some(encoding) = self.content_encoding.as_deref().filter(|e| !e.is_empty()) {
            head.push_str(&format!("Content-Encoding: {}\r\n", encoding));
        }
        if let Some(content_type) = self.content_type.as_deref().filter(|t| !t.is_empty()) {
            head.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        if let Some(length) = self.content_length {
            head.push_str(&format!("Content-Length: {}\r\n", length));
        }
        head.push_str("\r\n");

        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_has_no_headers() {
        let bytes = Response::not_found().to_bytes().unwrap();
        assert_eq!(bytes, b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn headers_come_in_fixed_order() {
        let mut resp = Response::with_status(StatusCode::Ok).with_body("text/plain", "abc");
        resp.content_encoding = Some("gzip".into());
        let bytes = resp.to_bytes().unwrap();
        assert_eq!(
            bytes,
            b"HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc"
        );
    }

    #[test]
    fn binary_body_is_written_verbatim() {
        let body = vec![0u8, 1, 0, 2];
        let resp = Response::with_status(StatusCode::Ok)
            .with_body("application/octet-stream", body.clone());
        let bytes = resp.to_bytes().unwrap();
        assert!(bytes.ends_with(&body));
        assert!(bytes
            .windows(b"Content-Length: 4\r\n".len())
            .any(|w| w == b"Content-Length: 4\r\n"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let resp = Response::with_status(StatusCode::Ok).with_body("text/plain", "hello");
        assert_eq!(resp.to_bytes().unwrap(), resp.to_bytes().unwrap());
    }

    #[test]
    fn unset_status_is_an_error() {
        assert_eq!(Response::default().to_bytes(), Err(FormatError::StatusUnset));
    }

    #[test]
    fn mismatched_length_is_an_error() {
        let mut resp = Response::with_status(StatusCode::Ok).with_body("text/plain", "abc");
        resp.content_length = Some(10);
        assert_eq!(
            resp.to_bytes(),
            Err(FormatError::LengthMismatch {
                declared: 10,
                actual: 3
            })
        );
    }

    #[test]
    fn empty_optional_headers_are_skipped() {
        let mut resp = Response::with_status(StatusCode::Created);
        resp.content_type = Some(String::new());
        assert_eq!(resp.to_bytes().unwrap(), b"HTTP/1.1 201 Created\r\n\r\n");
    }

    #[test]
    fn version_falls_back_to_default() {
        let resp = Response::not_found().with_version("garbage");
        assert_eq!(resp.http_version, DEFAULT_HTTP_VERSION);
        let resp = Response::not_found().with_version("HTTP/1.0");
        assert_eq!(resp.http_version, "HTTP/1.0");
    }
}
