// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{Credentials, RegisterRequest, UserRecord},
    relay::AuthDecision,
    state::AppState,
};

pub mod account;
pub mod health;
pub mod proxy;
pub mod session;

pub fn router(state: AppState) -> Router {
    let relay_routes = Router::new()
        .route("/session/verify", get(session::verify_session))
        .route("/session/me", get(session::current_user))
        .route("/auth/login", post(account::login))
        .route("/auth/register", post(account::register))
        .route("/auth/logout", post(account::logout))
        .route("/proxy/{*path}", any(proxy::forward))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .merge(relay_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Convert an orchestration outcome into an HTTP response.
///
/// Refreshed cookies ride along on the authorized response; rejection and
/// internal failure map to the structured 401/500 bodies the host expects.
pub(crate) fn decision_response<T>(
    decision: AuthDecision<T>,
    to_response: impl FnOnce(T) -> Response,
) -> Response {
    match decision {
        AuthDecision::Authorized {
            value,
            refreshed_cookies,
        } => {
            let mut response = to_response(value);
            append_set_cookies(&mut response, &refreshed_cookies);
            response
        }
        AuthDecision::Unauthorized => {
            ApiError::unauthorized("session credentials rejected").into_response()
        }
        AuthDecision::ServerError(cause) => {
            tracing::error!(%cause, "orchestration pass failed");
            ApiError::internal().into_response()
        }
    }
}

/// Append raw `Set-Cookie` values from a refresh to an outgoing response, so
/// the client's browser picks up the renewed session cookies.
pub(crate) fn append_set_cookies(response: &mut Response, set_cookies: &[String]) {
    for cookie in set_cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        session::verify_session,
        session::current_user,
        account::login,
        account::register,
        account::logout,
        health::health,
        health::liveness
    ),
    components(schemas(
        UserRecord,
        Credentials,
        RegisterRequest,
        session::VerifyResponse,
        health::HealthResponse
    )),
    tags(
        (name = "Session", description = "Cookie verification and user lookup with silent refresh"),
        (name = "Account", description = "Login, registration and logout pass-through"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;
