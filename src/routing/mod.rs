//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (method, target, headers, body)
//!     → router.rs (ordered lookup)
//!     → matcher.rs (home, echo, user-agent, files)
//!     → Return: Response, or 404 Not Found when every route declines
//! ```
//!
//! # Design Decisions
//! - Routes fixed at startup, immutable at runtime
//! - No regex (exact and prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by priority)

pub mod matcher;
pub mod router;

pub use matcher::Route;
pub use router::{Router, RouterSettings};
