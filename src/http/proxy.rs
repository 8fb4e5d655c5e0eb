//! HTTP forwarding to the feed.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the feed base URL
//! - Stream responses back untouched (forwarded paths, website assets)
//! - Buffer and rewrite feed metadata so it points at the external origin
//!
//! # Cancellation
//! The upstream call and the upstream body are owned by the inbound
//! request's handler future and response body. When the client goes away
//! hyper drops both, which aborts the call to the feed.

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::feed::FeedEndpoint;
use crate::http::origin::{rewrite_feed_urls, ExternalOrigin};
use crate::http::response::{strip_hop_by_hop, ProxyError};
use crate::http::static_files::content_type_for;

pub type HttpClient = Client<HttpConnector, Body>;

/// Forwards requests to the feed.
#[derive(Clone)]
pub struct HttpProxy {
    client: HttpClient,
    feed: FeedEndpoint,
}

impl HttpProxy {
    pub fn new(feed: FeedEndpoint) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, feed }
    }

    pub fn feed(&self) -> &FeedEndpoint {
        &self.feed
    }

    /// Clone the inbound request into one addressed at the feed.
    fn upstream_request(&self, req: Request<Body>) -> Result<Request<Body>, ProxyError> {
        let (parts, body) = req.into_parts();
        let url = self.feed.http_url(parts.uri.path(), parts.uri.query());

        let mut builder = Request::builder().method(parts.method).uri(url);
        if let Some(headers) = builder.headers_mut() {
            *headers = parts.headers;
            strip_hop_by_hop(headers);
            headers.remove(header::HOST);
        }

        Ok(builder.body(body)?)
    }

    /// Streaming passthrough: status, headers, and body copied unbuffered.
    pub async fn forward(&self, req: Request<Body>) -> Result<Response, ProxyError> {
        let upstream = self.upstream_request(req)?;
        let target = upstream.uri().clone();

        let response = self.client.request(upstream).await?;
        tracing::debug!(target = %target, status = %response.status(), "Feed responded");

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Rewritten passthrough: the whole body is read as text and every feed
    /// base URL is replaced by the caller's origin.
    pub async fn forward_rewritten(
        &self,
        req: Request<Body>,
        origin: &ExternalOrigin,
    ) -> Result<Response, ProxyError> {
        let mut upstream = self.upstream_request(req)?;
        // The body is rewritten as text, so it must arrive uncompressed.
        upstream.headers_mut().remove(header::ACCEPT_ENCODING);

        let response = self.client.request(upstream).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX).await?;

        let text = String::from_utf8_lossy(&bytes);
        let rewritten = rewrite_feed_urls(&text, &self.feed.base_url, origin);

        let mut response = (status, rewritten).into_response();
        if let Ok(value) = HeaderValue::from_str(&content_type_for("meta.json")) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn upstream_request_targets_feed() {
        let proxy = HttpProxy::new(FeedEndpoint::from_port(4100));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/items?page=2")
            .header("host", "dev.local")
            .header("connection", "keep-alive")
            .header("authorization", "Bearer x")
            .body(Body::from("{}"))
            .unwrap();

        let upstream = proxy.upstream_request(req).unwrap();

        assert_eq!(upstream.method(), Method::POST);
        assert_eq!(upstream.uri(), "http://localhost:4100/api/items?page=2");
        assert!(!upstream.headers().contains_key(header::HOST));
        assert!(!upstream.headers().contains_key(header::CONNECTION));
        assert_eq!(upstream.headers()[header::AUTHORIZATION], "Bearer x");
    }

    #[tokio::test]
    async fn unreachable_feed_is_bad_gateway() {
        let port = crate::net::allocate_port().unwrap();
        let proxy = HttpProxy::new(FeedEndpoint::from_port(port));
        let req = Request::builder().uri("/$pilet-api").body(Body::empty()).unwrap();

        let err = proxy.forward(req).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }
}
