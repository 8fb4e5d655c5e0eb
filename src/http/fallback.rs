//! Entry HTML with the pilet debugging configuration injected.
//!
//! Rendered per request: the injected API URL depends on the host the
//! browser used.

use std::path::PathBuf;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::headers::LocalResponseHeaders;
use crate::http::origin::ExternalOrigin;
use crate::routing::{INDEX_HTML, PILET_API_SEGMENT};

const SCRIPT_MARKER: &str = "<script";

/// Build the inline script assigning the debug API URL.
pub fn injection_script(api_base_url: &str) -> String {
    format!(
        "<script>/* Pilet Debugging Emulator Config Injection */window['dbg:pilet-api'] = '{}';</script>",
        api_base_url
    )
}

/// Insert the script right before the first `<script`. HTML without any
/// script tag is returned unchanged.
pub fn inject_debug_config(html: &str, api_base_url: &str) -> String {
    match html.find(SCRIPT_MARKER) {
        Some(index) => {
            let script = injection_script(api_base_url);
            let mut output = String::with_capacity(html.len() + script.len());
            output.push_str(&html[..index]);
            output.push_str(&script);
            output.push_str(&html[index..]);
            output
        }
        None => html.to_string(),
    }
}

/// Serves the app shell's `index.html`.
#[derive(Debug, Clone)]
pub struct FallbackHtml {
    index_path: PathBuf,
    headers: LocalResponseHeaders,
}

impl FallbackHtml {
    pub fn new(app_dir: impl Into<PathBuf>, headers: LocalResponseHeaders) -> Self {
        Self {
            index_path: app_dir.into().join(INDEX_HTML),
            headers,
        }
    }

    pub async fn render(&self, origin: &ExternalOrigin) -> Response {
        let html = match tokio::fs::read_to_string(&self.index_path).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(path = %self.index_path.display(), error = %e, "Failed to read entry HTML");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Entry HTML not available").into_response();
            }
        };

        let content = inject_debug_config(&html, &origin.api_base_url(PILET_API_SEGMENT));

        let mut response = content.into_response();
        let headers = response.headers_mut();
        self.headers.apply(headers);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_before_first_script_only() {
        let html = r#"<html><head><script src="a.js"></script></head><body><script src="b.js"></script></body></html>"#;
        let result = inject_debug_config(html, "https://dev.local/$pilet-api");

        assert_eq!(
            result,
            concat!(
                r#"<html><head><script>/* Pilet Debugging Emulator Config Injection */window['dbg:pilet-api'] = 'https://dev.local/$pilet-api';</script>"#,
                r#"<script src="a.js"></script></head><body><script src="b.js"></script></body></html>"#
            )
        );
        assert_eq!(result.matches("dbg:pilet-api").count(), 1);
    }

    #[test]
    fn html_without_script_is_unchanged() {
        let html = "<html><body>static</body></html>";
        assert_eq!(inject_debug_config(html, "http://x/$pilet-api"), html);
    }

    #[tokio::test]
    async fn render_uses_request_origin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<body><script src=\"app.js\"></script></body>").unwrap();
        let fallback = FallbackHtml::new(dir.path(), LocalResponseHeaders::new("Development", false));

        for host in ["one.local", "two.local:8080"] {
            let response = fallback.render(&ExternalOrigin::new("http", host)).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(body.contains(&format!("window['dbg:pilet-api'] = 'http://{}/$pilet-api';", host)));
        }
    }

    #[tokio::test]
    async fn missing_index_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = FallbackHtml::new(dir.path(), LocalResponseHeaders::new("Development", false));

        let response = fallback.render(&ExternalOrigin::new("http", "x")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
