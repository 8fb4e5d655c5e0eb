//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Args → Config layers → Validate → Layout + instance
//!          → Allocate port → Spawn feed → Bounded wait → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests
//!          (bounded; second signal or deadline aborts)
//!          → Stop the feed process → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: nothing is served until the feed port is known
//! - The feed is stopped only after the server has drained or was aborted
//! - Shutdown has a deadline: streaming responses cannot keep the feed alive

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Drain, Shutdown};
pub use startup::{prepare, prepare_from_env, run, Prepared, StartupError};
