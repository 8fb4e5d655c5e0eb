//! Development gateway for pilets.
//!
//! Sits between the browser, a Piral emulator app shell on disk, and the
//! pilet debug feed running as a child process. Every request is classified
//! once and answered by exactly one of: the WebSocket relay, the feed proxy,
//! the local static file servers, or the fallback HTML page.

pub mod cli;
pub mod config;
pub mod feed;
pub mod http;
pub mod instance;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
