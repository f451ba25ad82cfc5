//! Request parsing.
//!
//! # Responsibilities
//! - Turn one raw frame into a structured `Request`
//! - Recognise the handful of headers the routes care about
//! - Capture the body declared by Content-Length
//!
//! # Design Decisions
//! - Parsing never fails: malformed input leaves fields at their defaults
//! - Every field is bounded by `Limits`; overflow truncates, it never errors
//! - Header names compare ASCII case-insensitively
//! - Unknown headers are ignored
//! - Target and header values stay raw bytes; nothing is re-encoded

use std::fmt;

use crate::http::limits::{truncate_field, Limits};

/// Request method. Only GET and POST are distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    Get,
    Post,
    #[default]
    Unknown,
}

impl Method {
    fn from_token(token: &[u8]) -> Self {
        if token.eq_ignore_ascii_case(b"GET") {
            Method::Get
        } else if token.eq_ignore_ascii_case(b"POST") {
            Method::Post
        } else {
            Method::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request. Empty fields mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Request target as sent; empty unless it started with `/`.
    pub target: Vec<u8>,
    pub http_version: String,
    pub host: Vec<u8>,
    pub user_agent: Vec<u8>,
    pub content_type: Vec<u8>,
    /// Accept-Encoding tokens in header order.
    pub accepted_encodings: Vec<String>,
    /// Declared Content-Length, `None` when the header is absent.
    pub content_length: Option<usize>,
    pub body: Vec<u8>,
    headers_complete: bool,
    body_capped: bool,
}

impl Request {
    /// True when fewer body bytes were captured than Content-Length declared.
    pub fn body_truncated(&self) -> bool {
        self.content_length
            .map(|declared| self.body.len() < declared)
            .unwrap_or(false)
    }

    /// True once the header section ended and the declared body is present,
    /// or as much of it as the body limit allows.
    pub fn is_complete(&self) -> bool {
        if !self.headers_complete {
            return false;
        }
        match self.content_length {
            Some(declared) => self.body.len() >= declared || self.body_capped,
            None => true,
        }
    }
}

/// Parses frames into requests under a fixed set of limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestParser {
    limits: Limits,
}

impl RequestParser {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Parse one frame. Bytes beyond `max_frame_bytes` are ignored.
    pub fn parse(&self, frame: &[u8]) -> Request {
        let frame = &frame[..frame.len().min(self.limits.max_frame_bytes)];
        let mut req = Request::default();
        let mut lines = Lines::new(frame);

        let Some(request_line) = lines.next() else {
            return req;
        };
        self.parse_request_line(request_line.bytes, &mut req);

        let mut body_start = None;
        let mut headers_complete = false;
        for line in lines {
            if line.bytes.is_empty() {
                body_start = Some(line.end);
                headers_complete = true;
                break;
            }
            let mut words = tokens(line.bytes);
            let Some(name) = words.next() else {
                continue;
            };
            if !name.ends_with(b":") {
                // Not `field:`-shaped, so the body starts on this line. An
                // unterminated line with no declared body may still be a
                // header that has not fully arrived.
                body_start = Some(line.start);
                headers_complete = line.terminated || req.content_length.is_some();
                break;
            }
            self.apply_header(name, words, &mut req);
        }

        req.headers_complete = headers_complete;
        if let Some(start) = body_start {
            if let Some(declared) = req.content_length {
                let available = &frame[start..];
                let take = declared
                    .min(available.len())
                    .min(self.limits.max_body_bytes);
                req.body = available[..take].to_vec();
                req.body_capped = declared > self.limits.max_body_bytes
                    && take == self.limits.max_body_bytes;
            }
        }

        req
    }

    fn parse_request_line(&self, line: &[u8], req: &mut Request) {
        for (index, token) in tokens(line).enumerate() {
            match index {
                0 => req.method = Method::from_token(token),
                1 => {
                    if token.starts_with(b"/") {
                        req.target = self.field(token);
                    }
                }
                2 => req.http_version = self.text(token),
                _ => break,
            }
        }
    }

    fn apply_header<'a>(
        &self,
        name: &[u8],
        values: impl Iterator<Item = &'a [u8]>,
        req: &mut Request,
    ) {
        let name = &name[..name.len() - 1];
        let values: Vec<&[u8]> = values.collect();

        if name.eq_ignore_ascii_case(b"Host") {
            req.host = self.joined(&values);
        } else if name.eq_ignore_ascii_case(b"User-Agent") {
            req.user_agent = self.joined(&values);
        } else if name.eq_ignore_ascii_case(b"Content-Type") {
            req.content_type = self.joined(&values);
        } else if name.eq_ignore_ascii_case(b"Accept-Encoding") {
            req.accepted_encodings = values
                .into_iter()
                .flat_map(|value| value.split(|b| *b == b','))
                .filter(|token| !token.is_empty())
                .take(self.limits.max_encodings)
                .map(|token| self.text(token))
                .collect();
        } else if name.eq_ignore_ascii_case(b"Content-Length") {
            let declared = values.first().map(|v| parse_length(v)).unwrap_or(0);
            req.content_length = Some(declared);
        }
    }

    fn field(&self, bytes: &[u8]) -> Vec<u8> {
        truncate_field(bytes, self.limits.max_field_bytes)
    }

    /// Protocol tokens (version, encodings) that are only ever compared as text.
    fn text(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(&self.field(bytes)).into_owned()
    }

    fn joined(&self, values: &[&[u8]]) -> Vec<u8> {
        let joined = values.join(&b' ');
        self.field(&joined)
    }
}

/// Decimal prefix parse with `strtol` leniency: leading sign and digits only,
/// no digits yields 0, negatives clamp to 0.
fn parse_length(token: &[u8]) -> usize {
    let (negative, digits) = match token.first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let value = digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0usize, |acc, b| {
            acc.saturating_mul(10).saturating_add(usize::from(b - b'0'))
        });
    if negative {
        0
    } else {
        value
    }
}

/// Non-empty, space-separated tokens of a line.
fn tokens(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|b| *b == b' ').filter(|token| !token.is_empty())
}

struct Line<'a> {
    bytes: &'a [u8],
    /// Offset of the first byte of the line in the frame.
    start: usize,
    /// Offset just past the line terminator.
    end: usize,
    /// Whether the line ended with CRLF.
    terminated: bool,
}

/// CRLF-delimited lines of a frame. A trailing unterminated empty segment is not yielded.
struct Lines<'a> {
    frame: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(frame: &'a [u8]) -> Self {
        Self { frame, pos: 0 }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.frame.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.frame[start..];
        match rest.windows(2).position(|w| w == b"\r\n") {
            Some(len) => {
                self.pos = start + len + 2;
                Some(Line {
                    bytes: &rest[..len],
                    start,
                    end: self.pos,
                    terminated: true,
                })
            }
            None => {
                self.pos = self.frame.len();
                Some(Line {
                    bytes: rest,
                    start,
                    end: self.pos,
                    terminated: false,
                })
            }
        }
    }
}
