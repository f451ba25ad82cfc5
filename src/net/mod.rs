//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, one frame in, one response out)
//!     → Hand off to HTTP pipeline
//!
//! Connection States:
//!     Accepting → Reading → Responding → Closed
//! ```
//!
//! # Design Decisions
//! - Accepting pauses while every worker slot is busy
//! - Each connection tracked for graceful shutdown
//! - One request per connection; no keep-alive

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
