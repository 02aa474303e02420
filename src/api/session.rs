// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session verification and user lookup.
//!
//! Both handlers run one orchestration pass: the downstream action is the
//! backend call itself, so a rejected session gets exactly one silent
//! refresh before the 401 is surfaced.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::backend::BackendError;
use crate::relay::{RefreshOrchestrator, RelayRequest};
use crate::state::AppState;

use super::decision_response;

/// Verification result body.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub status: String,
}

/// Check whether the caller's session cookies are valid, refreshing them
/// silently once if not.
#[utoipa::path(
    get,
    path = "/session/verify",
    tag = "Session",
    responses(
        (status = 200, description = "Session is valid", body = VerifyResponse),
        (status = 401, description = "Session rejected and could not be refreshed")
    )
)]
pub async fn verify_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request = RelayRequest::new(Method::GET, "/protected/verify", headers, Bytes::new());

    let backend = state.backend.clone();
    let orchestrator = RefreshOrchestrator::new(state.backend.clone());
    let decision = orchestrator
        .run(&request, move |req| {
            let backend = backend.clone();
            async move {
                if backend.verify(&req.cookie_header()).await {
                    Ok(())
                } else {
                    Err(BackendError::CredentialRejected)
                }
            }
        })
        .await;

    decision_response(decision, |()| {
        Json(VerifyResponse {
            status: "authorized".to_string(),
        })
        .into_response()
    })
}

/// Fetch the user record behind the caller's session cookies, refreshing
/// them silently once if the fetch is rejected.
#[utoipa::path(
    get,
    path = "/session/me",
    tag = "Session",
    responses(
        (status = 200, description = "Current user", body = crate::models::UserRecord),
        (status = 401, description = "Session rejected and could not be refreshed")
    )
)]
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request = RelayRequest::new(Method::GET, "/protected/me", headers, Bytes::new());

    let backend = state.backend.clone();
    let orchestrator = RefreshOrchestrator::new(state.backend.clone());
    let decision = orchestrator
        .run(&request, move |req| {
            let backend = backend.clone();
            async move { backend.fetch_user(&req.cookie_header()).await }
        })
        .await;

    decision_response(decision, |user| Json(user).into_response())
}
