//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID)
//!     → routing::Router (exactly one RouteKind)
//!     → websocket.rs | proxy.rs | static_files.rs | fallback.rs
//!     → headers.rs / response.rs (local header set, hop-by-hop stripping)
//!     → Send to client
//! ```

pub mod fallback;
pub mod headers;
pub mod origin;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;
pub mod websocket;

pub use origin::{rewrite_feed_urls, ExternalOrigin};
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, SitePaths};
