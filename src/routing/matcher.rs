//! Route matchers.
//!
//! # Responsibilities
//! - Decide whether a request belongs to a route
//! - Produce the complete response for requests they accept
//!
//! # Design Decisions
//! - Target matching is case-sensitive, by exact path or prefix
//! - A matcher either declines (`None`) or fully populates the response
//! - Only `FilesRoute` touches the filesystem

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A route that may answer a request.
pub trait Route: Send + Sync + std::fmt::Debug {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns a response if this route handles the request.
    fn respond(&self, req: &Request) -> Option<Response>;
}

/// `/` exactly: 200 with no body.
#[derive(Debug, Clone, Default)]
pub struct HomeRoute;

impl Route for HomeRoute {
    fn name(&self) -> &'static str {
        "home"
    }

    fn respond(&self, req: &Request) -> Option<Response> {
        (req.target == b"/").then(|| Response::with_status(StatusCode::Ok))
    }
}

/// `/echo/<text>`: echoes `<text>` as plain text.
#[derive(Debug, Clone, Default)]
pub struct EchoRoute;

impl EchoRoute {
    const PREFIX: &'static [u8] = b"/echo/";
}

impl Route for EchoRoute {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn respond(&self, req: &Request) -> Option<Response> {
        let text = req.target.strip_prefix(Self::PREFIX)?;
        Some(Response::with_status(StatusCode::Ok).with_body(TEXT_PLAIN, text))
    }
}

/// `/user-agent`: returns the client's User-Agent header.
#[derive(Debug, Clone, Default)]
pub struct UserAgentRoute;

impl Route for UserAgentRoute {
    fn name(&self) -> &'static str {
        "user-agent"
    }

    fn respond(&self, req: &Request) -> Option<Response> {
        req.target.starts_with(b"/user-agent").then(|| {
            Response::with_status(StatusCode::Ok).with_body(TEXT_PLAIN, req.user_agent.as_slice())
        })
    }
}

/// `/files/<name>`: reads (GET) or writes (POST) `<name>` under a root directory.
///
/// Every failure, read or write, answers 404 Not Found.
#[derive(Debug, Clone)]
pub struct FilesRoute {
    root: PathBuf,
    max_body_bytes: usize,
    reject_path_traversal: bool,
}

impl FilesRoute {
    const PREFIX: &'static [u8] = b"/files/";

    /// `root` may be empty, in which case names resolve against the working directory.
    pub fn new(root: impl Into<PathBuf>, max_body_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_body_bytes,
            reject_path_traversal: false,
        }
    }

    /// Answer 404 for names with `..` components instead of resolving them.
    pub fn reject_path_traversal(mut self, reject: bool) -> Self {
        self.reject_path_traversal = reject;
        self
    }

    fn resolve(&self, name: &[u8]) -> Option<PathBuf> {
        let skip = name.iter().take_while(|b| **b == b'/').count();
        let relative = path_from_bytes(&name[skip..]);
        if self.reject_path_traversal
            && relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            tracing::warn!(name = %name.escape_ascii(), "Rejected path traversal attempt");
            return None;
        }
        Some(self.root.join(relative))
    }

    fn read(&self, path: &Path) -> Response {
        match read_capped(path, self.max_body_bytes) {
            Ok(contents) => {
                Response::with_status(StatusCode::Ok).with_body(OCTET_STREAM, contents)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "File read failed");
                Response::not_found()
            }
        }
    }

    fn write(&self, path: &Path, req: &Request) -> Response {
        let declared = req.content_length.unwrap_or(0);
        match write_all(path, &req.body) {
            Ok(written) if written == declared => Response::with_status(StatusCode::Created),
            Ok(written) => {
                tracing::warn!(
                    path = %path.display(),
                    written,
                    declared,
                    "Partial file write"
                );
                Response::not_found()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "File write failed");
                Response::not_found()
            }
        }
    }
}

impl Route for FilesRoute {
    fn name(&self) -> &'static str {
        "files"
    }

    fn respond(&self, req: &Request) -> Option<Response> {
        let name = req.target.strip_prefix(Self::PREFIX)?;
        if req.method == Method::Unknown {
            return None;
        }
        let Some(path) = self.resolve(name) else {
            return Some(Response::not_found());
        };
        let resp = match req.method {
            Method::Get => self.read(&path),
            _ => self.write(&path, req),
        };
        Some(resp)
    }
}

/// File names are taken byte for byte where the platform allows it.
#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

fn read_capped(path: &Path, cap: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut contents = Vec::new();
    file.take(cap as u64).read_to_end(&mut contents)?;
    Ok(contents)
}

fn write_all(path: &Path, body: &[u8]) -> io::Result<usize> {
    let mut file = File::create(path)?;
    file.write_all(body)?;
    file.flush()?;
    Ok(body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RequestParser;

    fn request(raw: &[u8]) -> Request {
        RequestParser::default().parse(raw)
    }

    #[test]
    fn home_matches_root_only() {
        assert!(HomeRoute.respond(&request(b"GET / HTTP/1.1\r\n\r\n")).is_some());
        assert!(HomeRoute.respond(&request(b"GET /x HTTP/1.1\r\n\r\n")).is_none());
    }

    #[test]
    fn echo_returns_suffix() {
        let resp = EchoRoute
            .respond(&request(b"GET /echo/hello HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::Ok));
        assert_eq!(resp.content_type.as_deref(), Some(TEXT_PLAIN));
        assert_eq!(resp.body, b"hello");
        assert_eq!(resp.content_length, Some(5));

        assert!(EchoRoute.respond(&request(b"GET /echo HTTP/1.1\r\n\r\n")).is_none());
    }

    #[test]
    fn echo_keeps_raw_bytes() {
        let resp = EchoRoute
            .respond(&request(b"GET /echo/\xff HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(resp.body, b"\xff");
        assert_eq!(resp.content_length, Some(1));
    }

    #[test]
    fn user_agent_is_echoed() {
        let resp = UserAgentRoute
            .respond(&request(
                b"GET /user-agent HTTP/1.1\r\nUser-Agent: foobar/1.2.3\r\n\r\n",
            ))
            .unwrap();
        assert_eq!(resp.body, b"foobar/1.2.3");
        assert_eq!(resp.content_length, Some(12));
    }

    #[test]
    fn files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path(), 2048);

        let created = route
            .respond(&request(
                b"POST /files/a.bin HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03",
            ))
            .unwrap();
        assert_eq!(created.status, Some(StatusCode::Created));

        let fetched = route
            .respond(&request(b"GET /files/a.bin HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(fetched.status, Some(StatusCode::Ok));
        assert_eq!(fetched.content_type.as_deref(), Some(OCTET_STREAM));
        assert_eq!(fetched.body, vec![0, 1, 2, 3]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path(), 2048);
        let resp = route
            .respond(&request(b"GET /files/missing HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::NotFound));
    }

    #[test]
    fn post_without_content_length_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path(), 2048);
        let resp = route
            .respond(&request(b"POST /files/empty HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::Created));
        assert_eq!(std::fs::read(dir.path().join("empty")).unwrap(), b"");
    }

    #[cfg(unix)]
    #[test]
    fn file_names_are_not_reencoded() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path(), 2048);
        let resp = route
            .respond(&request(
                b"POST /files/a\xffb HTTP/1.1\r\nContent-Length: 1\r\n\r\nx",
            ))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::Created));
        let name = OsStr::from_bytes(b"a\xffb");
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"x");
    }

    #[test]
    fn unwritable_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path().join("no-such-dir"), 2048);
        let resp = route
            .respond(&request(
                b"POST /files/a HTTP/1.1\r\nContent-Length: 1\r\n\r\nx",
            ))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::NotFound));
    }

    #[test]
    fn truncated_upload_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path(), 2048);
        let resp = route
            .respond(&request(
                b"POST /files/a HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc",
            ))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::NotFound));
    }

    #[test]
    fn large_files_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big"), vec![b'x'; 100]).unwrap();
        let route = FilesRoute::new(dir.path(), 10);
        let resp = route
            .respond(&request(b"GET /files/big HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(resp.body.len(), 10);
        assert_eq!(resp.content_length, Some(10));
    }

    #[test]
    fn unknown_method_declines() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path(), 2048);
        assert!(route
            .respond(&request(b"PUT /files/a HTTP/1.1\r\n\r\n"))
            .is_none());
    }

    #[test]
    fn traversal_rejected_when_hardened() {
        let dir = tempfile::tempdir().unwrap();
        let route = FilesRoute::new(dir.path().join("root"), 2048).reject_path_traversal(true);
        std::fs::create_dir(dir.path().join("root")).unwrap();
        std::fs::write(dir.path().join("secret"), b"s").unwrap();

        let resp = route
            .respond(&request(b"GET /files/../secret HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(resp.status, Some(StatusCode::NotFound));
    }
}
