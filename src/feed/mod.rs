//! Feed subsystem.
//!
//! The feed is an external process serving pilet metadata, files, and an
//! update WebSocket on a loopback port. The gateway only knows its endpoint
//! and how to stop it.
//!
//! # Data Flow
//! ```text
//! net::allocate_port()
//!     → supervisor.rs (spawn, bounded readiness wait)
//!     → endpoint.rs (FeedEndpoint handed to the HTTP server)
//!     → supervisor.rs (kill on gateway shutdown)
//! ```

pub mod endpoint;
pub mod supervisor;

pub use endpoint::FeedEndpoint;
pub use supervisor::{FeedError, FeedProcess};
