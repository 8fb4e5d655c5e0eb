//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     port.rs (ask the OS for a free loopback port)
//!     → feed process binds it
//!
//! Per WebSocket upgrade:
//!     connection.rs (session ID, live session count)
//!     → released when the relay loop exits
//! ```

pub mod connection;
pub mod port;

pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use port::allocate_port;
