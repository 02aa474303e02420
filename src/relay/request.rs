// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Immutable snapshot of an inbound request, and the cookie-replacing
//! transform used to replay it.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::cookies;
use crate::models::RefreshOutcome;

/// An inbound request captured for relaying.
///
/// The body is buffered so that non-idempotent methods (POST with a payload)
/// replay faithfully. Values of this type are never mutated; replaying
/// produces a new value via [`RelayRequest::with_refreshed_cookies`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RelayRequest {
    pub fn new(
        method: Method,
        target: impl Into<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            target: target.into(),
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path and query, relative to the destination base URL.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The raw `Cookie` header value, or the empty string when absent or
    /// not valid UTF-8.
    pub fn cookie_header(&self) -> String {
        self.headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string()
    }

    /// Derive the request to replay after a refresh.
    ///
    /// `NotRefreshed` yields a value equal to the original (callers should
    /// not take this branch, but it is a safe no-op). `Refreshed` yields an
    /// identical request whose `Cookie` header is replaced by the
    /// serialization of the new cookie values; the original's stale cookies
    /// are dropped entirely.
    pub fn with_refreshed_cookies(&self, outcome: &RefreshOutcome) -> RelayRequest {
        let set_cookies = match outcome {
            RefreshOutcome::NotRefreshed => return self.clone(),
            RefreshOutcome::Refreshed(set_cookies) => set_cookies,
        };

        let mut headers = self.headers.clone();
        let serialized = cookies::serialize(set_cookies);
        match HeaderValue::from_str(&serialized) {
            Ok(value) if !serialized.is_empty() => {
                headers.insert(header::COOKIE, value);
            }
            _ => {
                // Nothing usable came back: replay without cookies rather
                // than with the rejected ones.
                headers.remove(header::COOKIE);
            }
        }

        RelayRequest {
            method: self.method.clone(),
            target: self.target.clone(),
            headers,
            body: self.body.clone(),
        }
    }
}
