// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the remote authentication service.
//!
//! Each operation is a single HTTP round trip with the inbound request's
//! cookies forwarded verbatim. Verification calls fold transport failures
//! into "not authorized" - the relay fails closed rather than distinguishing
//! a dead network from rejected credentials. Refresh failures of any kind
//! collapse into [`RefreshOutcome::NotRefreshed`]; no call here retries.

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::cookies::{self, REFRESH_TOKEN_COOKIE};
use crate::models::{Credentials, PassthroughResponse, RefreshOutcome, RegisterRequest, UserRecord};

/// Errors talking to the authentication service.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("auth service transport failure: {0}")]
    Transport(String),

    #[error("credentials rejected by auth service")]
    CredentialRejected,

    #[error("refresh rejected by auth service")]
    RefreshRejected,

    #[error("auth service returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Whether this error should trigger the refresh branch of the
    /// orchestrator. Malformed 2xx payloads count: the source treats bad
    /// data and rejected credentials identically.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self,
            BackendError::CredentialRejected | BackendError::MalformedResponse(_)
        )
    }
}

/// Operations the relay needs from the authentication service.
///
/// The trait seam exists so the refresh orchestrator and the HTTP surface
/// can be exercised against an in-memory double.
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// Check whether the session cookies are currently valid.
    ///
    /// Any non-2xx status or transport failure yields `false`.
    async fn verify(&self, cookie_header: &str) -> bool;

    /// Fetch the user record for the current session.
    async fn fetch_user(&self, cookie_header: &str) -> Result<UserRecord, BackendError>;

    /// Attempt one silent credential refresh.
    ///
    /// If no `refresh_token` cookie is present, returns `NotRefreshed`
    /// without touching the network.
    async fn refresh(&self, cookie_header: &str) -> RefreshOutcome;

    /// Pass-through login call.
    async fn login(&self, credentials: &Credentials) -> Result<PassthroughResponse, BackendError>;

    /// Pass-through register call.
    async fn register(
        &self,
        registration: &RegisterRequest,
    ) -> Result<PassthroughResponse, BackendError>;

    /// Pass-through logout call; invalidates the session server-side.
    async fn logout(&self, cookie_header: &str) -> Result<PassthroughResponse, BackendError>;
}

/// `AuthBackend` implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    base_url: String,
    tenant_id: i64,
    http: Client,
}

impl HttpAuthBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.auth_base_url.clone(),
            tenant_id: config.tenant_id,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_cookies(builder: RequestBuilder, cookie_header: &str) -> RequestBuilder {
        if cookie_header.is_empty() {
            builder
        } else {
            builder.header(header::COOKIE, cookie_header)
        }
    }

    /// Relay a pass-through response: status, body, content type and every
    /// `Set-Cookie` value, byte-for-byte.
    async fn relay(path: &str, response: Response) -> Result<PassthroughResponse, BackendError> {
        let status = response.status();
        let set_cookies = collect_set_cookies(response.headers());
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(format!("{path} body read failed: {e}")))?;

        Ok(PassthroughResponse {
            status: StatusCode::from_u16(status.as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type,
            set_cookies,
            body,
        })
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn verify(&self, cookie_header: &str) -> bool {
        let request = Self::with_cookies(
            self.http.get(self.url("/protected/verify")),
            cookie_header,
        );

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "verify call failed, treating as unauthorized");
                false
            }
        }
    }

    async fn fetch_user(&self, cookie_header: &str) -> Result<UserRecord, BackendError> {
        let request =
            Self::with_cookies(self.http.get(self.url("/protected/me")), cookie_header);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // Fail closed: a dead network reads the same as rejection.
                warn!(error = %e, "user fetch failed, treating as unauthorized");
                return Err(BackendError::CredentialRejected);
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "user fetch rejected");
            return Err(BackendError::CredentialRejected);
        }

        response
            .json::<UserRecord>()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))
    }

    async fn refresh(&self, cookie_header: &str) -> RefreshOutcome {
        let refresh_token = match cookies::extract(cookie_header, REFRESH_TOKEN_COOKIE) {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!("no refresh token cookie present, skipping refresh call");
                return RefreshOutcome::NotRefreshed;
            }
        };

        let request = Self::with_cookies(self.http.post(self.url("/refresh")), cookie_header)
            .json(&json!({ "refresh_token": refresh_token }));

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                let set_cookies = collect_set_cookies(response.headers());
                info!(cookies = set_cookies.len(), "session refresh accepted");
                RefreshOutcome::Refreshed(set_cookies)
            }
            Ok(response) => {
                warn!(status = %response.status(), "session refresh rejected");
                RefreshOutcome::NotRefreshed
            }
            Err(e) => {
                warn!(error = %e, "session refresh call failed");
                RefreshOutcome::NotRefreshed
            }
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<PassthroughResponse, BackendError> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
                "tenant_id": self.tenant_id,
            }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("login call failed: {e}")))?;

        Self::relay("/login", response).await
    }

    async fn register(
        &self,
        registration: &RegisterRequest,
    ) -> Result<PassthroughResponse, BackendError> {
        let response = self
            .http
            .post(self.url("/register"))
            .json(&json!({
                "email": registration.email,
                "password": registration.password,
                "tenant_id": self.tenant_id,
                "external_id": registration.external_id,
            }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("register call failed: {e}")))?;

        Self::relay("/register", response).await
    }

    async fn logout(&self, cookie_header: &str) -> Result<PassthroughResponse, BackendError> {
        let response = Self::with_cookies(self.http.post(self.url("/logout")), cookie_header)
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("logout call failed: {e}")))?;

        Self::relay("/logout", response).await
    }
}

/// Collect every `Set-Cookie` value from a response header map, in order.
fn collect_set_cookies(headers: &reqwest::header::HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}


#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::str::FromStr;
    use std::time::Duration;

    use super::*;

    fn test_config() -> Config {
        Config {
            addr: SocketAddr::from_str("127.0.0.1:0").unwrap(),
            // Reserved TEST-NET-1 address: any accidental network call fails fast.
            auth_base_url: "http://192.0.2.1:4000/api".to_string(),
            upstream_base_url: "http://192.0.2.1:3000".to_string(),
            tenant_id: 1,
            backend_timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn urls_are_joined_against_the_base() {
        let backend = HttpAuthBackend::new(&test_config()).unwrap();
        assert_eq!(
            backend.url("/protected/verify"),
            "http://192.0.2.1:4000/api/protected/verify"
        );
    }

    #[tokio::test]
    async fn refresh_without_token_skips_the_network() {
        let backend = HttpAuthBackend::new(&test_config()).unwrap();
        // No refresh_token cookie: must return immediately, no network call
        // (the base URL is unroutable, so a call would error after a delay).
        let outcome = backend.refresh("access_token=abc").await;
        assert_eq!(outcome, RefreshOutcome::NotRefreshed);

        let outcome = backend.refresh("").await;
        assert_eq!(outcome, RefreshOutcome::NotRefreshed);
    }

    #[tokio::test]
    async fn refresh_with_empty_token_skips_the_network() {
        let backend = HttpAuthBackend::new(&test_config()).unwrap();
        let outcome = backend.refresh("refresh_token=").await;
        assert_eq!(outcome, RefreshOutcome::NotRefreshed);
    }

    #[test]
    fn credential_rejection_classification() {
        assert!(BackendError::CredentialRejected.is_credential_rejection());
        assert!(BackendError::MalformedResponse("x".into()).is_credential_rejection());
        assert!(!BackendError::Transport("x".into()).is_credential_rejection());
        assert!(!BackendError::RefreshRejected.is_credential_rejection());
    }

    #[test]
    fn set_cookies_are_collected_in_order() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.append(header::SET_COOKIE, "access_token=a; Path=/".parse().unwrap());
        headers.append(header::SET_COOKIE, "refresh_token=b; HttpOnly".parse().unwrap());

        let cookies = collect_set_cookies(&headers);
        assert_eq!(
            cookies,
            vec![
                "access_token=a; Path=/".to_string(),
                "refresh_token=b; HttpOnly".to_string()
            ]
        );
    }
}
