//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayConfig::default()
//!     → loader.rs (optional TOML file, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → loader.rs (merge blazor-devserversettings.json `Piral` section)
//!     → CLI overrides (main.rs)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; forwarded paths are read once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_settings, load_config, load_settings, ConfigError};
pub use schema::{
    DevServerSettings, FeedConfig, GatewayConfig, ListenerConfig, ObservabilityConfig,
    TimeoutConfig, WebSocketConfig,
};
pub use validation::{validate_config, ValidationError};
