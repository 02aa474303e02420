// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The refresh orchestrator.
//!
//! One orchestration pass walks `Start -> Verifying -> {Authorized |
//! Refreshing} -> {Replaying | Failed} -> Done`. The pass is parameterized
//! over the downstream action so the pass-through, user-fetch and proxy call
//! shapes share a single implementation instead of duplicating the state
//! machine.
//!
//! The retry bound is structural: the loop body runs at most twice (the
//! original attempt plus one replay), and the refresh call sits on the path
//! from the first iteration to the second. A second rejection can only fall
//! through to `Unauthorized`.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{AuthBackend, BackendError};
use crate::models::RefreshOutcome;
use crate::relay::request::RelayRequest;

/// Terminal result of one orchestration pass.
#[derive(Debug)]
pub enum AuthDecision<T> {
    /// The downstream action succeeded. `refreshed_cookies` carries the raw
    /// `Set-Cookie` values from a successful refresh so the HTTP layer can
    /// relay them to the client; it is empty when no refresh happened.
    Authorized {
        value: T,
        refreshed_cookies: Vec<String>,
    },
    /// Credentials were rejected and could not be refreshed, or were
    /// rejected again after the one permitted replay.
    Unauthorized,
    /// An internal failure outside the credential path. Never surfaced as a
    /// raw error across the component boundary.
    ServerError(String),
}

pub struct RefreshOrchestrator {
    backend: Arc<dyn AuthBackend>,
}

impl RefreshOrchestrator {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self { backend }
    }

    /// Run one orchestration pass.
    ///
    /// `action` is the caller's downstream action (verify, user fetch, or
    /// verify-and-forward). It receives the request to act on and reports a
    /// credential rejection via [`BackendError::is_credential_rejection`];
    /// any other error ends the pass as `ServerError`.
    pub async fn run<T, F, Fut>(&self, original: &RelayRequest, action: F) -> AuthDecision<T>
    where
        F: Fn(RelayRequest) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut request = original.clone();
        let mut refreshed_cookies: Vec<String> = Vec::new();

        for replayed in [false, true] {
            match action(request.clone()).await {
                Ok(value) => {
                    return AuthDecision::Authorized {
                        value,
                        refreshed_cookies,
                    };
                }
                Err(err) if err.is_credential_rejection() => {
                    if replayed {
                        warn!("replayed request rejected again, giving up");
                        return AuthDecision::Unauthorized;
                    }

                    match self.backend.refresh(&request.cookie_header()).await {
                        RefreshOutcome::Refreshed(set_cookies) => {
                            debug!(
                                cookies = set_cookies.len(),
                                "credentials refreshed, replaying request"
                            );
                            request = original
                                .with_refreshed_cookies(&RefreshOutcome::Refreshed(
                                    set_cookies.clone(),
                                ));
                            refreshed_cookies = set_cookies;
                        }
                        RefreshOutcome::NotRefreshed => {
                            debug!("refresh rejected, request fails closed");
                            return AuthDecision::Unauthorized;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "downstream action failed outside the credential path");
                    return AuthDecision::ServerError(err.to_string());
                }
            }
        }

        // Both iterations return above; kept for the compiler.
        AuthDecision::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, HeaderValue, Method};

    use super::*;
    use crate::backend::testing::MockBackend;

    fn request_with_cookies(cookies: &'static str) -> RelayRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static(cookies));
        RelayRequest::new(Method::GET, "/resource", headers, Bytes::new())
    }

    /// Action double that records every cookie header it sees and follows a
    /// script of results.
    struct ScriptedAction {
        calls: AtomicUsize,
        seen_cookies: Mutex<Vec<String>>,
    }

    impl ScriptedAction {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen_cookies: Mutex::new(Vec::new()),
            })
        }

        fn record(&self, request: &RelayRequest) -> usize {
            self.seen_cookies
                .lock()
                .unwrap()
                .push(request.cookie_header());
            self.calls.fetch_add(1, Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn valid_credentials_skip_refresh() {
        let backend = Arc::new(MockBackend::new());
        let orchestrator = RefreshOrchestrator::new(backend.clone());
        let script = ScriptedAction::new();

        let request = request_with_cookies("access_token=abc");
        let decision = orchestrator
            .run(&request, |req| {
                let script = script.clone();
                async move {
                    script.record(&req);
                    Ok::<_, BackendError>(200)
                }
            })
            .await;

        match decision {
            AuthDecision::Authorized {
                value,
                refreshed_cookies,
            } => {
                assert_eq!(value, 200);
                assert!(refreshed_cookies.is_empty());
            }
            other => panic!("expected Authorized, got {other:?}"),
        }
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_then_refreshed_replays_exactly_once() {
        let backend = Arc::new(MockBackend::new().with_refresh(RefreshOutcome::Refreshed(vec![
            "access_token=new123; Path=/; HttpOnly".to_string(),
        ])));
        let orchestrator = RefreshOrchestrator::new(backend.clone());
        let script = ScriptedAction::new();

        let request = request_with_cookies("access_token=stale; refresh_token=old");
        let decision = orchestrator
            .run(&request, |req| {
                let script = script.clone();
                async move {
                    if script.record(&req) == 0 {
                        Err(BackendError::CredentialRejected)
                    } else {
                        Ok(200)
                    }
                }
            })
            .await;

        match decision {
            AuthDecision::Authorized {
                value,
                refreshed_cookies,
            } => {
                assert_eq!(value, 200);
                assert_eq!(
                    refreshed_cookies,
                    vec!["access_token=new123; Path=/; HttpOnly".to_string()]
                );
            }
            other => panic!("expected Authorized, got {other:?}"),
        }

        assert_eq!(script.calls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);

        // The replay carried exactly the refreshed cookie; the stale ones
        // were dropped.
        let seen = script.seen_cookies.lock().unwrap();
        assert_eq!(seen[0], "access_token=stale; refresh_token=old");
        assert_eq!(seen[1], "access_token=new123");
    }

    #[tokio::test]
    async fn second_rejection_never_triggers_a_second_refresh() {
        let backend = Arc::new(MockBackend::new().with_refresh(RefreshOutcome::Refreshed(vec![
            "access_token=new123".to_string(),
        ])));
        let orchestrator = RefreshOrchestrator::new(backend.clone());
        let script = ScriptedAction::new();

        let request = request_with_cookies("access_token=stale; refresh_token=old");
        let decision = orchestrator
            .run(&request, |req| {
                let script = script.clone();
                async move {
                    script.record(&req);
                    Err::<(), _>(BackendError::CredentialRejected)
                }
            })
            .await;

        assert!(matches!(decision, AuthDecision::Unauthorized));
        assert_eq!(script.calls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_ends_the_pass() {
        let backend = Arc::new(MockBackend::new()); // refresh: NotRefreshed
        let orchestrator = RefreshOrchestrator::new(backend.clone());
        let script = ScriptedAction::new();

        let request = request_with_cookies("access_token=stale");
        let decision = orchestrator
            .run(&request, |req| {
                let script = script.clone();
                async move {
                    script.record(&req);
                    Err::<(), _>(BackendError::CredentialRejected)
                }
            })
            .await;

        assert!(matches!(decision, AuthDecision::Unauthorized));
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_credential_errors_become_server_errors() {
        let backend = Arc::new(MockBackend::new());
        let orchestrator = RefreshOrchestrator::new(backend.clone());

        let request = request_with_cookies("access_token=abc");
        let decision = orchestrator
            .run(&request, |_req| async {
                Err::<(), _>(BackendError::Transport("connection reset".to_string()))
            })
            .await;

        match decision {
            AuthDecision::ServerError(cause) => {
                assert!(cause.contains("connection reset"));
            }
            other => panic!("expected ServerError, got {other:?}"),
        }
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_payload_takes_the_refresh_branch() {
        let backend = Arc::new(MockBackend::new()); // NotRefreshed
        let orchestrator = RefreshOrchestrator::new(backend.clone());

        let request = request_with_cookies("access_token=abc");
        let decision = orchestrator
            .run(&request, |_req| async {
                Err::<(), _>(BackendError::MalformedResponse("bad json".to_string()))
            })
            .await;

        assert!(matches!(decision, AuthDecision::Unauthorized));
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    }
}
