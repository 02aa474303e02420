// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, registration and logout pass-through.
//!
//! These calls carry no orchestration: the backend's status, body and
//! `Set-Cookie` headers are relayed to the client unmodified so the browser
//! receives the session cookies exactly as the authentication service set
//! them.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::Response,
    Json,
};
use tracing::info;

use crate::error::ApiError;
use crate::models::{Credentials, PassthroughResponse, RegisterRequest};
use crate::state::AppState;

/// Build the relayed response for a pass-through backend call.
fn relay_response(relayed: PassthroughResponse) -> Response {
    let mut builder = Response::builder().status(relayed.status);
    if let Some(content_type) = relayed
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let mut response = builder
        .body(Body::from(relayed.body))
        .unwrap_or_else(|_| Response::new(Body::empty()));
    for cookie in &relayed.set_cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Log a client in against the authentication service.
///
/// The tenant identifier is injected server-side; the client only supplies
/// email and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Account",
    request_body = Credentials,
    responses(
        (status = 200, description = "Backend response relayed, session cookies set"),
        (status = 502, description = "Authentication service unreachable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    let relayed = state.backend.login(&credentials).await?;
    info!(status = %relayed.status, "login relayed");
    Ok(relay_response(relayed))
}

/// Register a new account against the authentication service.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Account",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Backend response relayed, session cookies set"),
        (status = 502, description = "Authentication service unreachable")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let relayed = state.backend.register(&registration).await?;
    info!(status = %relayed.status, "registration relayed");
    Ok(relay_response(relayed))
}

/// Invalidate the caller's session server-side.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Account",
    responses(
        (status = 200, description = "Backend response relayed, session cookies cleared"),
        (status = 502, description = "Authentication service unreachable")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let relayed = state.backend.logout(cookie_header).await?;
    Ok(relay_response(relayed))
}
