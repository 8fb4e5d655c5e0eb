//! Shared utilities for integration testing.
//!
//! Fake feeds listen on ephemeral loopback ports and are addressed the way
//! the real feed is (`http://localhost:<port>`). The gateway under test is
//! built from a temporary app shell directory.

#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;

use futures_util::StreamExt;
use pilet_gateway::config::GatewayConfig;
use pilet_gateway::feed::FeedEndpoint;
use pilet_gateway::http::{HttpServer, SitePaths};
use pilet_gateway::instance::PiralInstance;
use pilet_gateway::lifecycle::Shutdown;
use pilet_gateway::routing::DiscoveredFiles;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type FeedSocket = WebSocketStream<TcpStream>;

pub const INDEX: &str = "<html><head><title>Shell</title><script src=\"index.js\"></script></head><body></body></html>";

/// Temporary app shell and pilet output directories.
pub struct Site {
    pub dir: TempDir,
    pub paths: SitePaths,
}

impl Site {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let paths = SitePaths {
            dist_dir: root.join("dist"),
            app_dir: root.join("shell").join("app"),
            app_shell_manifest: root.join("shell").join("package.json"),
        };
        fs::create_dir_all(&paths.dist_dir).unwrap();
        fs::create_dir_all(&paths.app_dir).unwrap();
        fs::write(paths.app_dir.join("index.html"), INDEX).unwrap();

        Self { dir, paths }
    }

    pub fn app_file(self, name: &str, content: &[u8]) -> Self {
        write_file(&self.paths.app_dir, name, content);
        self
    }

    pub fn dist_file(self, name: &str, content: &[u8]) -> Self {
        write_file(&self.paths.dist_dir, name, content);
        self
    }
}

fn write_file(root: &Path, name: &str, content: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A gateway running on an ephemeral port. Shuts down when dropped.
pub struct Gateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn config_with_forwarded(paths: &[&str]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.forwarded_paths = paths.iter().map(|p| p.to_string()).collect();
    config
}

/// Start a gateway serving `site` against `feed`.
pub async fn start_gateway(
    config: GatewayConfig,
    instance: PiralInstance,
    site: &Site,
    feed: FeedEndpoint,
    website_files: &[&str],
) -> Gateway {
    let (addr, shutdown, _task) = spawn_gateway(config, instance, site, feed, website_files).await;
    Gateway { addr, shutdown }
}

/// Like [`start_gateway`], handing out the shutdown coordinator and the
/// server task instead of tying them to a guard.
pub async fn spawn_gateway(
    config: GatewayConfig,
    instance: PiralInstance,
    site: &Site,
    feed: FeedEndpoint,
    website_files: &[&str],
) -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::with_discovered(
        config,
        &instance,
        site.paths.clone(),
        feed,
        DiscoveredFiles::preloaded(website_files.iter().copied()),
    );

    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    (addr, shutdown, task)
}

/// The regular (non-website) shell.
pub fn shell() -> PiralInstance {
    PiralInstance::new("sample-piral", false)
}

/// Start a fake HTTP feed. `app` receives the feed's base URL.
pub async fn start_http_feed<F>(app: F) -> FeedEndpoint
where
    F: FnOnce(String) -> axum::Router,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let feed = FeedEndpoint::from_port(listener.local_addr().unwrap().port());
    let router = app(feed.base_url.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    feed
}

/// Start a fake WebSocket feed running `session` for every connection.
/// `session` receives the socket and the feed's base URL.
pub async fn start_ws_feed<F, Fut>(session: F) -> FeedEndpoint
where
    F: Fn(FeedSocket, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let feed = FeedEndpoint::from_port(listener.local_addr().unwrap().port());
    let base_url = feed.base_url.clone();
    let session = std::sync::Arc::new(session);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let session = session.clone();
            let base_url = base_url.clone();
            tokio::spawn(async move {
                if let Ok(socket) = tokio_tungstenite::accept_async(stream).await {
                    session(socket, base_url).await;
                }
            });
        }
    });

    feed
}

/// A feed endpoint nothing listens on.
pub fn unreachable_feed() -> FeedEndpoint {
    FeedEndpoint::from_port(pilet_gateway::net::allocate_port().unwrap())
}

/// HTTP client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Connect a browser-side WebSocket to the gateway.
pub async fn connect(url: &str) -> ClientSocket {
    let (socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    socket
}

/// Read client messages until the socket ends, with a deadline.
pub async fn drain(socket: &mut ClientSocket) -> Vec<tokio_tungstenite::tungstenite::Message> {
    let mut messages = Vec::new();
    let collect = async {
        while let Some(Ok(message)) = socket.next().await {
            messages.push(message);
        }
    };
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), collect).await;
    messages
}
