//! Ordered request classification.
//!
//! # Responsibilities
//! - Map every request to exactly one [`RouteKind`]
//! - Evaluate rules top to bottom; the first match wins
//!
//! # Rules
//! 1. `<api>/0/…` → [`RouteKind::DirectPiletFile`]
//! 2. `<api>…` + WebSocket upgrade → [`RouteKind::PiletApiWebSocket`]
//! 3. `<api>…` + GET → [`RouteKind::PiletApiMeta`]
//! 4. forwarded prefix → [`RouteKind::ForwardedPath`]
//! 5. website mode + discovered emulator file → [`RouteKind::WebsiteAsset`]
//! 6. local app file → [`RouteKind::StaticFile`], else [`RouteKind::Fallback`]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{Method, Request};
use percent_encoding::percent_decode_str;
use tokio::sync::OnceCell;

use crate::instance::website_emulator_files;
use crate::routing::matcher::{
    relative_file_path, AnyPrefixMatcher, Matcher, MethodMatcher, PathPrefixMatcher, UpgradeMatcher,
};

/// URL prefix of all feed traffic.
pub const PILET_API_SEGMENT: &str = "/$pilet-api";

/// Entry HTML of the app shell; never proxied as a website asset.
pub const INDEX_HTML: &str = "index.html";

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// A file from the pilet's build output, relative to the dist dir.
    DirectPiletFile { path: String },
    PiletApiWebSocket,
    PiletApiMeta,
    ForwardedPath,
    /// A website emulator file, by logical name.
    WebsiteAsset { name: String },
    /// A physical app shell file, relative to the app dir.
    StaticFile { path: PathBuf },
    Fallback,
}

impl RouteKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::DirectPiletFile { .. } => "direct_pilet_file",
            RouteKind::PiletApiWebSocket => "pilet_api_websocket",
            RouteKind::PiletApiMeta => "pilet_api_meta",
            RouteKind::ForwardedPath => "forwarded_path",
            RouteKind::WebsiteAsset { .. } => "website_asset",
            RouteKind::StaticFile { .. } => "static_file",
            RouteKind::Fallback => "fallback",
        }
    }
}

/// Answers whether a relative path names a servable local file.
pub trait FileProbe: Send + Sync {
    fn is_file(&self, relative: &Path) -> bool;
}

/// Probes a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryProbe {
    root: PathBuf,
}

impl DirectoryProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileProbe for DirectoryProbe {
    fn is_file(&self, relative: &Path) -> bool {
        std::fs::metadata(self.root.join(relative))
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

/// File names of the website emulator, read from the app shell manifest at
/// most once.
///
/// The first website-mode request initializes it; concurrent first requests
/// wait on the same initialization. An empty result is kept, which disables
/// rule 5 for the rest of the process.
#[derive(Debug)]
pub struct DiscoveredFiles {
    manifest: PathBuf,
    files: OnceCell<HashSet<String>>,
}

impl DiscoveredFiles {
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            files: OnceCell::new(),
        }
    }

    /// A set that is already known, without touching the disk.
    pub fn preloaded<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = files.into_iter().map(Into::into).collect();
        Self {
            manifest: PathBuf::new(),
            files: OnceCell::new_with(Some(set)),
        }
    }

    pub async fn get(&self) -> &HashSet<String> {
        self.files
            .get_or_init(|| async {
                let manifest = self.manifest.clone();
                let files = tokio::task::spawn_blocking(move || website_emulator_files(&manifest))
                    .await
                    .unwrap_or_default();

                tracing::info!(
                    manifest = %self.manifest.display(),
                    count = files.len(),
                    "Discovered website emulator files"
                );
                files.into_iter().collect()
            })
            .await
    }
}

/// The compiled, immutable route table.
#[derive(Debug)]
pub struct Router {
    api: PathPrefixMatcher,
    direct_files: PathPrefixMatcher,
    upgrade: UpgradeMatcher,
    get: MethodMatcher,
    get_or_head: MethodMatcher,
    forwarded: AnyPrefixMatcher,
    is_website: bool,
}

impl Router {
    pub fn new(forwarded_paths: &[String], is_website: bool) -> Self {
        Self {
            api: PathPrefixMatcher::new(PILET_API_SEGMENT),
            direct_files: PathPrefixMatcher::new(format!("{}/0/", PILET_API_SEGMENT)),
            upgrade: UpgradeMatcher,
            get: MethodMatcher::new([Method::GET]),
            get_or_head: MethodMatcher::new([Method::GET, Method::HEAD]),
            forwarded: AnyPrefixMatcher::new(forwarded_paths.iter().cloned()),
            is_website,
        }
    }

    pub fn is_website(&self) -> bool {
        self.is_website
    }

    /// Classify a request.
    ///
    /// `website_files` is consulted only in website mode; `statics` only
    /// outside of it.
    pub fn classify<B>(
        &self,
        req: &Request<B>,
        website_files: &HashSet<String>,
        statics: &dyn FileProbe,
    ) -> RouteKind {
        let path = req.uri().path();

        if let Some(rest) = self.direct_files.strip(path) {
            return RouteKind::DirectPiletFile {
                path: rest.to_string(),
            };
        }

        if self.api.matches(req) {
            if self.upgrade.matches(req) {
                return RouteKind::PiletApiWebSocket;
            }
            if self.get.matches(req) {
                return RouteKind::PiletApiMeta;
            }
        }

        if self.forwarded.matches(req) {
            return RouteKind::ForwardedPath;
        }

        if self.is_website {
            let name = percent_decode_str(path.strip_prefix('/').unwrap_or(path)).decode_utf8_lossy();
            if name != INDEX_HTML && website_files.contains(name.as_ref()) {
                return RouteKind::WebsiteAsset {
                    name: name.into_owned(),
                };
            }
            return RouteKind::Fallback;
        }

        if self.get_or_head.matches(req) {
            if let Some(relative) = relative_file_path(path) {
                if statics.is_file(&relative) {
                    return RouteKind::StaticFile { path: relative };
                }
            }
        }

        RouteKind::Fallback
    }
}

/// Shared handle used by the HTTP layer.
pub type SharedRouter = Arc<Router>;
