//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Hold the ordered route list
//! - Try routes in priority order, first match wins
//! - Fall back to 404 Not Found when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over routes; the list is tiny

use std::path::PathBuf;

use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::matcher::{EchoRoute, FilesRoute, HomeRoute, Route, UserAgentRoute};

/// Name reported when no route matched.
pub const NO_ROUTE: &str = "none";

/// Settings the built-in route table needs.
#[derive(Debug, Clone, Default)]
pub struct RouterSettings {
    pub files_root: PathBuf,
    pub max_body_bytes: usize,
    pub reject_path_traversal: bool,
}

/// Ordered collection of routes.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Box<dyn Route>>,
}

impl Router {
    /// Empty router; every request gets 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table: home, echo, user-agent, files.
    pub fn standard(settings: RouterSettings) -> Self {
        let files = FilesRoute::new(settings.files_root, settings.max_body_bytes)
            .reject_path_traversal(settings.reject_path_traversal);
        Self::new()
            .route(HomeRoute)
            .route(EchoRoute)
            .route(UserAgentRoute)
            .route(files)
    }

    /// Append a route at the lowest priority.
    pub fn route(mut self, route: impl Route + 'static) -> Self {
        self.routes.push(Box::new(route));
        self
    }

    /// Produce the response for `req` and the name of the route that made it.
    pub fn dispatch(&self, req: &Request) -> (Response, &'static str) {
        let (resp, name) = self
            .routes
            .iter()
            .find_map(|route| route.respond(req).map(|resp| (resp, route.name())))
            .unwrap_or_else(|| (Response::not_found(), NO_ROUTE));

        tracing::debug!(route = name, target = %req.target.escape_ascii(), "Route selected");
        (resp.with_version(&req.http_version), name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
