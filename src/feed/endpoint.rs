//! Loopback address of the feed.

use url::Url;

/// How the gateway reaches the feed, and the base URL the feed writes into
/// its own responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEndpoint {
    /// `localhost:<port>`
    pub host: String,
    /// `http://localhost:<port>`, without trailing slash. This exact string is
    /// what gets rewritten in relayed text.
    pub base_url: String,
}

impl FeedEndpoint {
    pub fn from_port(port: u16) -> Self {
        let host = format!("localhost:{}", port);
        let base_url = format!("http://{}", host);
        Self { host, base_url }
    }

    pub fn port(&self) -> Option<u16> {
        self.host.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
    }

    /// Absolute HTTP URL for a request path and optional query.
    pub fn http_url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) if !query.is_empty() => format!("{}{}?{}", self.base_url, path, query),
            _ => format!("{}{}", self.base_url, path),
        }
    }

    /// WebSocket URL for the same path on the feed.
    pub fn ws_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.base_url)?.join(path)?;
        // http → ws is a permitted special-scheme switch.
        let _ = url.set_scheme("ws");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls_from_port() {
        let feed = FeedEndpoint::from_port(53921);
        assert_eq!(feed.host, "localhost:53921");
        assert_eq!(feed.base_url, "http://localhost:53921");
        assert_eq!(feed.port(), Some(53921));
        assert_eq!(
            feed.http_url("/$pilet-api", Some("v=1")),
            "http://localhost:53921/$pilet-api?v=1"
        );
        assert_eq!(feed.http_url("/api/x", Some("")), "http://localhost:53921/api/x");
        assert_eq!(
            feed.ws_url("/$pilet-api").unwrap().as_str(),
            "ws://localhost:53921/$pilet-api"
        );
    }
}
