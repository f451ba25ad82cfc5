//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! request frame (bytes)
//!     → request.rs (parse into Request)
//!     → [routing layer produces Response]
//!     → encoding.rs (gzip when accepted)
//!     → response.rs (serialize to bytes)
//!     → server.rs writes the bytes and closes
//! ```

pub mod encoding;
pub mod limits;
pub mod request;
pub mod response;
pub mod server;

pub use limits::Limits;
pub use request::{Method, Request, RequestParser};
pub use response::{FormatError, Response, StatusCode};
pub use server::{HttpServer, Pipeline};
