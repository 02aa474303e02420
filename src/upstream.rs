// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forwarding proxied requests to the application upstream.
//!
//! The forwarder reissues a [`RelayRequest`] against the configured upstream
//! base URL and buffers the response for relaying. Hop-by-hop headers are
//! stripped in both directions; everything else is forwarded byte-for-byte.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use reqwest::Client;
use tracing::debug;

use crate::backend::BackendError;
use crate::config::Config;
use crate::relay::request::RelayRequest;

/// Headers that must not cross the proxy boundary.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// A buffered upstream response ready to relay to the client.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forwards requests to the upstream application.
#[async_trait]
pub trait Forwarder: Send + Sync + 'static {
    async fn forward(&self, request: &RelayRequest) -> Result<ProxiedResponse, BackendError>;
}

/// `Forwarder` implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    base_url: String,
    http: Client,
}

impl HttpForwarder {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.upstream_base_url.clone(),
            http,
        })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: &RelayRequest) -> Result<ProxiedResponse, BackendError> {
        let url = format!("{}{}", self.base_url, request.target());
        debug!(method = %request.method(), %url, "forwarding request upstream");

        let response = self
            .http
            .request(request.method().clone(), &url)
            .headers(forwardable_headers(request.headers()))
            .body(request.body().clone())
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("upstream call failed: {e}")))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = forwardable_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(format!("upstream body read failed: {e}")))?;

        Ok(ProxiedResponse {
            status,
            headers,
            body,
        })
    }
}

/// Copy a header map, dropping hop-by-hop headers and `Content-Length`
/// (recomputed for the buffered body on the way out).
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str()) || name.as_str() == "content-length" {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}


#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("relay.internal"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("content-length", HeaderValue::from_static("42"));
        headers.insert("cookie", HeaderValue::from_static("access_token=abc"));
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let forwarded = forwardable_headers(&headers);
        assert!(forwarded.get("host").is_none());
        assert!(forwarded.get("connection").is_none());
        assert!(forwarded.get("content-length").is_none());
        assert_eq!(
            forwarded.get("cookie"),
            Some(&HeaderValue::from_static("access_token=abc"))
        );
        assert_eq!(
            forwarded.get("accept"),
            Some(&HeaderValue::from_static("application/json"))
        );
    }

    #[test]
    fn multi_value_headers_are_preserved() {
        let mut headers = HeaderMap::new();
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));

        let forwarded = forwardable_headers(&headers);
        assert_eq!(forwarded.get_all("x-trace").iter().count(), 2);
    }
}
