//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the development gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Hosting environment name, reported in the `Blazor-Environment` header.
    pub environment: String,

    /// Path prefixes streamed to the feed as-is.
    pub forwarded_paths: Vec<String>,

    /// Feed process settings.
    pub feed: FeedConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// WebSocket relay settings.
    pub websocket: WebSocketConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            environment: "Development".to_string(),
            forwarded_paths: Vec::new(),
            feed: FeedConfig::default(),
            timeouts: TimeoutConfig::default(),
            websocket: WebSocketConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Development mode enables the browser tooling headers.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("Development")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Feed process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Executable used to start the feed.
    pub command: String,

    /// Arguments passed before `--port <port>`.
    pub args: Vec<String>,

    /// Remote feed the local feed should merge in (`--feed <url>`).
    pub remote_feed_url: Option<String>,

    /// Upper bound on the wait for the feed port to accept connections.
    pub ready_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec!["pilet".to_string(), "debug".to_string()],
            remote_feed_url: None,
            ready_timeout_secs: 60,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,
    /// Time in-flight responses get to finish after a shutdown signal,
    /// in seconds. Whatever is still running afterwards is aborted.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// WebSocket relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Largest reassembled feed message accepted, in bytes.
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// The dev server settings file kept next to the application
/// (`blazor-devserversettings.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevServerSettings {
    #[serde(default, alias = "Piral")]
    pub piral: Option<PiralOptions>,
}

/// The `Piral` section of the dev server settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PiralOptions {
    #[serde(default, alias = "forwardedPaths", alias = "ForwardedPaths")]
    pub forwarded_paths: Option<Vec<String>>,

    #[serde(default, alias = "feedUrl", alias = "FeedUrl")]
    pub feed_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development() {
        let config = GatewayConfig::default();
        assert!(config.is_development());
        assert!(config.forwarded_paths.is_empty());
        assert_eq!(config.feed.command, "npx");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            environment = "Staging"
            forwarded_paths = ["/api"]

            [listener]
            bind_address = "0.0.0.0:8080"
            "#,
        )
        .unwrap();

        assert!(!config.is_development());
        assert_eq!(config.forwarded_paths, vec!["/api".to_string()]);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.timeouts.shutdown_secs, 10);
    }

    #[test]
    fn settings_accept_pascal_case_section() {
        let settings: DevServerSettings = serde_json::from_str(
            r#"{ "Piral": { "forwardedPaths": ["/graphql"], "feedUrl": "https://feed.example/api" } }"#,
        )
        .unwrap();

        let piral = settings.piral.unwrap();
        assert_eq!(piral.forwarded_paths.unwrap(), vec!["/graphql".to_string()]);
        assert_eq!(piral.feed_url.as_deref(), Some("https://feed.example/api"));
    }
}
