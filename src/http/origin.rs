//! Externally visible origin of a request, and feed URL rewriting.
//!
//! The feed writes its own loopback base URL into metadata and update
//! messages. Everything relayed to the browser has that URL replaced by the
//! origin the browser used, so the loopback address never leaks.

use axum::http::{header, Request};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// `scheme://host` as seen by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOrigin {
    pub scheme: String,
    pub host: String,
}

impl ExternalOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Derive the origin from the inbound request.
    ///
    /// The gateway does not terminate TLS, so the scheme is `http` unless a
    /// fronting proxy says otherwise via `X-Forwarded-Proto`. The host comes
    /// from the `Host` header, then the URI authority, then `default_host`.
    pub fn from_request<B>(req: &Request<B>, default_host: &str) -> Self {
        let scheme = req
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v == "http" || v == "https")
            .unwrap_or_else(|| "http".to_string());

        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| req.uri().authority().map(|a| a.to_string()))
            .unwrap_or_else(|| default_host.to_string());

        Self { scheme, host }
    }

    /// Externally visible base URL of the pilet API.
    pub fn api_base_url(&self, api_segment: &str) -> String {
        format!("{}{}", self, api_segment)
    }
}

impl std::fmt::Display for ExternalOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Replace every literal occurrence of `feed_base_url` in `text` with the
/// external origin. Everything else is left byte-identical.
pub fn rewrite_feed_urls(text: &str, feed_base_url: &str, origin: &ExternalOrigin) -> String {
    if feed_base_url.is_empty() || !text.contains(feed_base_url) {
        return text.to_string();
    }
    text.replace(feed_base_url, &origin.to_string())
}
