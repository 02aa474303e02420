// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated proxying to the upstream application.
//!
//! The full verify-refresh-replay-forward cycle: the inbound request is
//! buffered, its cookies verified, and on rejection refreshed once before
//! the (rebuilt) request is forwarded upstream. The upstream response is
//! relayed back, with any refreshed cookies appended so the client catches
//! up.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::BackendError;
use crate::error::ApiError;
use crate::relay::{RefreshOrchestrator, RelayRequest};
use crate::state::AppState;
use crate::upstream::ProxiedResponse;

use super::decision_response;

/// Replay requires buffering the body; cap it so a client cannot pin
/// arbitrary memory.
const MAX_REPLAY_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Forward an inbound request to the upstream application after verifying
/// (and, once, refreshing) its session cookies.
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, MAX_REPLAY_BODY_BYTES).await {
        Ok(body) => body,
        Err(_) => {
            return ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "request body exceeds the replay buffer limit",
            )
            .into_response();
        }
    };

    let target = match parts.uri.query() {
        Some(query) => format!("/{path}?{query}"),
        None => format!("/{path}"),
    };
    let relay_request = RelayRequest::new(parts.method, target, parts.headers, body);

    let backend = state.backend.clone();
    let forwarder = state.forwarder.clone();
    let orchestrator = RefreshOrchestrator::new(state.backend.clone());
    let decision = orchestrator
        .run(&relay_request, move |req| {
            let backend = backend.clone();
            let forwarder = forwarder.clone();
            async move {
                // The verify gate runs on every attempt, so a replay with
                // still-bad cookies is rejected here, not upstream.
                if !backend.verify(&req.cookie_header()).await {
                    return Err(BackendError::CredentialRejected);
                }
                forwarder.forward(&req).await
            }
        })
        .await;

    decision_response(decision, proxied_response)
}

/// Relay a buffered upstream response to the client.
fn proxied_response(proxied: ProxiedResponse) -> Response {
    let mut response = Response::new(Body::from(proxied.body));
    *response.status_mut() = proxied.status;
    *response.headers_mut() = proxied.headers;
    response
}
