//! Feed process supervision.
//!
//! # Responsibilities
//! - Spawn exactly one feed process bound to the allocated port
//! - Forward its output into the log
//! - Wait (bounded) until the port accepts connections
//! - Kill the process when the gateway stops

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};

use crate::config::FeedConfig;
use crate::feed::FeedEndpoint;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Error type for feed process management.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to start feed '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// The running feed process.
pub struct FeedProcess {
    child: Child,
    endpoint: FeedEndpoint,
}

impl FeedProcess {
    /// Start the feed in `pilet_dir`, listening on `port`.
    pub fn spawn(config: &FeedConfig, port: u16, pilet_dir: &Path) -> Result<Self, FeedError> {
        let args = feed_args(config, port);

        tracing::info!(
            command = %config.command,
            args = ?args,
            cwd = %pilet_dir.display(),
            "Starting feed"
        );

        let mut child = Command::new(&config.command)
            .args(&args)
            .current_dir(pilet_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FeedError::Spawn {
                command: config.command.clone(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, true));
        }

        Ok(Self {
            child,
            endpoint: FeedEndpoint::from_port(port),
        })
    }

    pub fn endpoint(&self) -> &FeedEndpoint {
        &self.endpoint
    }

    /// Wait until the feed accepts connections, at most `timeout`.
    ///
    /// Proceeds anyway once the wait expires; requests made before the feed
    /// is up fail individually.
    pub async fn wait_ready(&mut self, timeout: Duration) -> FeedEndpoint {
        let port = self.endpoint.port().unwrap_or_default();

        if wait_for_port(port, timeout).await {
            tracing::info!(feed = %self.endpoint.base_url, "Feed is accepting connections");
        } else {
            tracing::warn!(
                feed = %self.endpoint.base_url,
                timeout_secs = timeout.as_secs(),
                "Feed not reachable in time, continuing anyway"
            );
        }

        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::error!(%status, "Feed process exited early");
        }

        self.endpoint.clone()
    }

    /// Kill the feed and reap it.
    pub async fn shutdown(mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::info!(%status, "Feed already exited");
                return;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not query feed status"),
        }

        if let Err(e) = self.child.kill().await {
            tracing::warn!(error = %e, "Failed to kill feed");
        } else {
            tracing::info!("Feed stopped");
        }
    }
}

/// Arguments for the feed command: configured args, the port, and the
/// optional remote feed.
pub fn feed_args(config: &FeedConfig, port: u16) -> Vec<String> {
    let mut args = config.args.clone();
    args.push("--port".to_string());
    args.push(port.to_string());

    if let Some(feed_url) = &config.remote_feed_url {
        args.push("--feed".to_string());
        args.push(feed_url.clone());
    }

    args
}

/// Poll a loopback port until it accepts a connection or `timeout` passes.
pub async fn wait_for_port(port: u16, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;

    loop {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(READY_POLL_INTERVAL).await;
    }
}

async fn forward_output<R: AsyncRead + Unpin>(reader: R, is_stderr: bool) {
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            tracing::warn!(target: "feed", "{}", line);
        } else {
            tracing::info!(target: "feed", "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_include_port_and_remote_feed() {
        let mut config = FeedConfig::default();
        assert_eq!(feed_args(&config, 4100), vec!["pilet", "debug", "--port", "4100"]);

        config.remote_feed_url = Some("https://feed.example/api/v1/pilet".into());
        assert_eq!(
            feed_args(&config, 4100),
            vec!["pilet", "debug", "--port", "4100", "--feed", "https://feed.example/api/v1/pilet"]
        );
    }

    #[tokio::test]
    async fn wait_for_port_sees_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(wait_for_port(port, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn wait_for_port_gives_up() {
        let port = crate::net::allocate_port().unwrap();
        let started = std::time::Instant::now();

        assert!(!wait_for_port(port, Duration::from_millis(300)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_and_shutdown_child() {
        let dir = tempfile::tempdir().unwrap();
        let config = FeedConfig {
            command: "sleep".into(),
            args: vec![],
            remote_feed_url: None,
            ready_timeout_secs: 1,
        };

        // `sleep --port N` fails fast on most platforms; either way shutdown must not hang.
        let feed = FeedProcess::spawn(&config, 4100, dir.path()).unwrap();
        assert_eq!(feed.endpoint().base_url, "http://localhost:4100");
        tokio::time::timeout(Duration::from_secs(5), feed.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_command_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = FeedConfig {
            command: "definitely-not-a-feed-binary".into(),
            ..FeedConfig::default()
        };

        let err = FeedProcess::spawn(&config, 4100, dir.path()).err().unwrap();
        assert!(err.to_string().contains("definitely-not-a-feed-binary"));
    }
}
