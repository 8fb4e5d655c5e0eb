//! Request predicates used by the classifier.
//!
//! # Design Decisions
//! - Path matching is case-sensitive prefix matching
//! - Upgrade detection follows RFC 6455: `Connection` lists the `upgrade`
//!   token and `Upgrade` names `websocket` (both case-insensitive)
//! - No regex

use std::path::{Component, Path, PathBuf};

use axum::http::{header, Method, Request};
use percent_encoding::percent_decode_str;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches<B>(&self, req: &Request<B>) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The part of `path` after the prefix, if it matches.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        req.uri().path().starts_with(&self.prefix)
    }
}

/// Matches when any of the contained prefixes match (OR semantics).
#[derive(Debug, Clone, Default)]
pub struct AnyPrefixMatcher {
    prefixes: Vec<PathPrefixMatcher>,
}

impl AnyPrefixMatcher {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(PathPrefixMatcher::new).collect(),
        }
    }
}

impl Matcher for AnyPrefixMatcher {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        self.prefixes.iter().any(|m| m.matches(req))
    }
}

/// Matches WebSocket upgrade handshakes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeMatcher;

impl Matcher for UpgradeMatcher {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        let headers = req.headers();

        let connection_upgrade = headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

        let upgrade_websocket = headers
            .get(header::UPGRADE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case("websocket"))
            .unwrap_or(false);

        connection_upgrade && upgrade_websocket
    }
}

/// Matches a set of methods.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: impl Into<Vec<Method>>) -> Self {
        Self {
            methods: methods.into(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        self.methods.contains(req.method())
    }
}

/// Turn a (percent-encoded) URL path into a relative filesystem path, for
/// probing whether a local file exists.
///
/// Returns `None` for anything that would leave the served directory, that
/// does not decode to UTF-8, or that names no file at all.
pub fn relative_file_path(url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    let mut relative = PathBuf::new();

    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/$pilet-api");

        assert!(matcher.matches(&get("http://localhost/$pilet-api/0/index.js")));
        assert!(!matcher.matches(&get("http://localhost/images")));
        assert_eq!(matcher.strip("/$pilet-api/0/a.js"), Some("/0/a.js"));
    }

    #[test]
    fn test_any_prefix_matcher() {
        let matcher = AnyPrefixMatcher::new(["/api", "/hub"]);

        assert!(matcher.matches(&get("/api/users")));
        assert!(matcher.matches(&get("/hub")));
        assert!(!matcher.matches(&get("/apps")));
        assert!(!AnyPrefixMatcher::default().matches(&get("/api")));
    }

    #[test]
    fn test_upgrade_matcher() {
        let upgrade = Request::builder()
            .uri("/$pilet-api")
            .header("Connection", "keep-alive, Upgrade")
            .header("Upgrade", "WebSocket")
            .body(Body::empty())
            .unwrap();
        assert!(UpgradeMatcher.matches(&upgrade));

        let plain = Request::builder()
            .uri("/$pilet-api")
            .header("Upgrade", "websocket")
            .body(Body::empty())
            .unwrap();
        assert!(!UpgradeMatcher.matches(&plain));
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new([Method::GET, Method::HEAD]);
        assert!(matcher.matches(&get("/")));

        let post = Request::builder().method(Method::POST).uri("/").body(Body::empty()).unwrap();
        assert!(!matcher.matches(&post));
    }

    #[test]
    fn relative_paths_stay_inside() {
        assert_eq!(relative_file_path("/css/site.css"), Some(PathBuf::from("css/site.css")));
        assert_eq!(relative_file_path("/./app.js"), Some(PathBuf::from("app.js")));
        assert_eq!(relative_file_path("/../secret"), None);
        assert_eq!(relative_file_path("/a/../../b"), None);
        assert_eq!(relative_file_path("/"), None);
    }

    #[test]
    fn relative_paths_are_percent_decoded() {
        assert_eq!(relative_file_path("/my%20file.txt"), Some(PathBuf::from("my file.txt")));
        assert_eq!(relative_file_path("/%2E%2E/secret"), None);
        assert_eq!(relative_file_path("/bad%FF"), None);
    }
}
