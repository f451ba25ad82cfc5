//! Minimal one-request-per-connection HTTP/1.1 server library.

pub mod config;
pub mod http;
pub mod net;
pub mod routing;

pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::{HttpServer, Pipeline};
pub use lifecycle::Shutdown;
