//! Local file serving for the app shell and the pilet build output.
//!
//! Files are streamed by `tower_http::services::ServeDir`, which also takes
//! care of percent-decoding, traversal rejection, HEAD, ranges and
//! conditional requests. This module only pins content types and adds the
//! local header set.
//!
//! # Design Decisions
//! - Unknown extensions are served as `application/octet-stream`, never
//!   rejected
//! - Runtime payload extensions are pinned regardless of what the generic
//!   guesser reports

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, uri::PathAndQuery, HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::headers::LocalResponseHeaders;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const WASM: &str = "application/wasm";

/// Extensions whose content type is fixed.
const CONTENT_TYPE_OVERRIDES: [(&str, &str); 6] = [
    ("dll", OCTET_STREAM),
    ("pdb", OCTET_STREAM),
    ("br", OCTET_STREAM),
    ("dat", OCTET_STREAM),
    ("blat", OCTET_STREAM),
    ("wasm", WASM),
];

/// Content type for a file name.
pub fn content_type_for(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    if let Some(extension) = extension.as_deref() {
        if let Some((_, content_type)) = CONTENT_TYPE_OVERRIDES
            .iter()
            .find(|(ext, _)| *ext == extension)
        {
            return (*content_type).to_string();
        }
    }

    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Serves files below one root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    dir: ServeDir,
    headers: LocalResponseHeaders,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, headers: LocalResponseHeaders) -> Self {
        let root = root.into();
        let dir = ServeDir::new(&root).append_index_html_on_directories(false);
        Self { root, dir, headers }
    }

    /// Serve the file named by the request path.
    pub async fn serve(&self, req: Request<Body>) -> Response {
        let decoded = percent_decode_str(req.uri().path())
            .decode_utf8_lossy()
            .into_owned();

        let response = match self.dir.clone().oneshot(req).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        };

        self.finish(response, &decoded)
    }

    /// Serve `sub_path` (still percent-encoded) below the root, ignoring the
    /// rest of the request path.
    pub async fn serve_sub_path(&self, req: Request<Body>, sub_path: &str) -> Response {
        let (mut parts, body) = req.into_parts();

        let path_and_query = match parts.uri.query() {
            Some(query) => format!("/{}?{}", sub_path.trim_start_matches('/'), query),
            None => format!("/{}", sub_path.trim_start_matches('/')),
        };
        match PathAndQuery::try_from(path_and_query) {
            Ok(path_and_query) => parts.uri = Uri::from(path_and_query),
            Err(e) => {
                tracing::warn!(path = %sub_path, error = %e, "Rejected file path");
                return StatusCode::NOT_FOUND.into_response();
            }
        }

        self.serve(Request::from_parts(parts, body)).await
    }

    fn finish(&self, mut response: Response, decoded_path: &str) -> Response {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::warn!(root = %self.root.display(), path = %decoded_path, "File not found");
            return response;
        }

        let headers = response.headers_mut();
        self.headers.apply(headers);
        if status.is_success() {
            if let Ok(value) = HeaderValue::from_str(&content_type_for(decoded_path)) {
                headers.insert(header::CONTENT_TYPE, value);
            }
        }

        tracing::trace!(root = %self.root.display(), path = %decoded_path, status = %status, "Served local file");
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(dir: &Path) -> StaticFiles {
        StaticFiles::new(dir, LocalResponseHeaders::new("Development", false))
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn overrides_win_over_guesser() {
        assert_eq!(content_type_for("styles.wasm"), WASM);
        assert_eq!(content_type_for("_framework/App.dll"), OCTET_STREAM);
        assert_eq!(content_type_for("App.PDB"), OCTET_STREAM);
        assert_eq!(content_type_for("dotnet.js.br"), OCTET_STREAM);
        assert_eq!(content_type_for("icudt.dat"), OCTET_STREAM);
        assert_eq!(content_type_for("App.blat"), OCTET_STREAM);
    }

    #[test]
    fn guesses_known_and_defaults_unknown() {
        assert_ne!(content_type_for("app.js"), OCTET_STREAM);
        assert!(content_type_for("app.js").contains("javascript"));
        assert_eq!(content_type_for("index.html"), "text/html");
        assert_eq!(content_type_for("meta.json"), "application/json");
        assert_eq!(content_type_for("blob.unknownext"), OCTET_STREAM);
        assert_eq!(content_type_for("LICENSE"), OCTET_STREAM);
    }

    #[tokio::test]
    async fn serves_bytes_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("styles.wasm"), b"\0asm").unwrap();

        let response = files(dir.path()).serve(request("GET", "/styles.wasm")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], WASM);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()["blazor-environment"], "Development");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"\0asm");
    }

    #[tokio::test]
    async fn head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.css"), "body{}").unwrap();

        let response = files(dir.path()).serve(request("HEAD", "/a.css")).await;

        assert_eq!(response.headers()[header::CONTENT_LENGTH], "6");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn encoded_names_are_decoded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my pilet.js"), "spaced").unwrap();
        let files = files(dir.path());

        let response = files
            .serve_sub_path(request("GET", "/$pilet-api/0/my%20pilet.js"), "my%20pilet.js")
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"spaced");
    }

    #[tokio::test]
    async fn missing_or_escaping_paths_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let files = files(dir.path());

        for sub_path in ["missing.js", "../etc/passwd", "sub"] {
            let response = files.serve_sub_path(request("GET", "/x"), sub_path).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", sub_path);
        }
    }
}
