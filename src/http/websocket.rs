//! WebSocket relay from the feed to the browser.
//!
//! # Responsibilities
//! - Complete the upgrade handshake with the browser
//! - Open a WebSocket to the feed on the same path
//! - Forward every complete feed message as one text frame, with the feed
//!   base URL rewritten to the browser's origin
//!
//! # Data Flow
//! ```text
//! Browser ←── text frames (rewritten) ── Gateway ←── messages ── Feed
//! ```
//!
//! # Design Decisions
//! - Fragmented feed messages are reassembled by the protocol layer; only
//!   complete messages reach the relay loop
//! - Sends are strictly sequential, so feed order is preserved
//! - Browser messages are drained and discarded; a browser Close ends the
//!   session before the next send
//! - No reconnect: a fault ends the session, the browser opens a new one
//! - Every exit path tries to close the browser socket (1000, or 1011 when
//!   the feed could not be reached)

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message as FeedMessage;

use crate::feed::FeedEndpoint;
use crate::http::origin::{rewrite_feed_urls, ExternalOrigin};
use crate::net::SessionTracker;
use crate::observability::metrics;

/// Everything one relay session needs.
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub feed: FeedEndpoint,
    pub origin: ExternalOrigin,
    /// Path and query on the feed.
    pub path: String,
    pub max_message_size: usize,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    /// The feed sent a Close frame.
    FeedClosed,
    /// The feed connection ended without a Close frame.
    FeedGone,
    /// The browser closed or dropped its socket.
    BrowserClosed,
    /// Receiving from the feed or sending to the browser failed.
    Fault(String),
}

/// Accept the upgrade and run the relay on the upgraded socket.
pub fn upgrade(ws: WebSocketUpgrade, target: RelayTarget, sessions: SessionTracker) -> Response {
    ws.on_upgrade(move |socket| async move {
        relay(socket, target, sessions).await;
    })
}

/// Decode a complete feed message into rewritten text.
///
/// Returns `None` for control messages, which are never forwarded.
pub fn relay_text(message: &FeedMessage, feed_base_url: &str, origin: &ExternalOrigin) -> Option<String> {
    let text = match message {
        FeedMessage::Text(text) => std::borrow::Cow::Borrowed(text.as_str()),
        FeedMessage::Binary(bytes) => String::from_utf8_lossy(bytes),
        FeedMessage::Ping(_) | FeedMessage::Pong(_) | FeedMessage::Close(_) | FeedMessage::Frame(_) => {
            return None
        }
    };
    Some(rewrite_feed_urls(&text, feed_base_url, origin))
}

async fn relay(frontend: WebSocket, target: RelayTarget, sessions: SessionTracker) {
    let session = sessions.track();
    let session_id = session.id();

    let url = match target.feed.ws_url(&target.path) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(session_id = %session_id, path = %target.path, error = %e, "Invalid feed WebSocket URL");
            close_frontend(frontend, close_code::ERROR).await;
            return;
        }
    };

    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(target.max_message_size);

    let mut backend =
        match tokio_tungstenite::connect_async_with_config(url.as_str(), Some(config), false).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                tracing::error!(session_id = %session_id, feed = %url, error = %e, "Feed WebSocket connection failed");
                close_frontend(frontend, close_code::ERROR).await;
                return;
            }
        };

    tracing::info!(session_id = %session_id, feed = %url, origin = %target.origin, "Relay session started");

    let (mut frontend_tx, mut frontend_rx) = frontend.split();
    let feed_base_url = target.feed.base_url.as_str();

    let end = loop {
        tokio::select! {
            incoming = frontend_rx.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break RelayEnd::BrowserClosed,
                Some(Err(e)) => {
                    tracing::debug!(session_id = %session_id, error = %e, "Browser socket error");
                    break RelayEnd::BrowserClosed;
                }
                Some(Ok(_)) => continue,
            },
            message = backend.next() => {
                let message = match message {
                    None => break RelayEnd::FeedGone,
                    Some(Err(e)) => break RelayEnd::Fault(e.to_string()),
                    Some(Ok(FeedMessage::Close(_))) => break RelayEnd::FeedClosed,
                    Some(Ok(message)) => message,
                };

                let Some(text) = relay_text(&message, feed_base_url, &target.origin) else {
                    continue;
                };

                if let Err(e) = frontend_tx.send(Message::Text(text.into())).await {
                    break RelayEnd::Fault(e.to_string());
                }
                metrics::ws_message_relayed();
            }
        }
    };

    match &end {
        RelayEnd::Fault(reason) => {
            tracing::warn!(session_id = %session_id, reason = %reason, "Relay session faulted")
        }
        other => tracing::info!(session_id = %session_id, end = ?other, "Relay session ended"),
    }

    if end != RelayEnd::BrowserClosed {
        let _ = frontend_tx
            .send(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: String::new().into(),
            })))
            .await;
    }
    let _ = frontend_tx.close().await;
    let _ = backend.close(None).await;
}

async fn close_frontend(mut frontend: WebSocket, code: u16) {
    let _ = frontend
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: String::new().into(),
        })))
        .await;
}
