// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire types shared between the HTTP surface and the backend client.

use axum::body::Bytes;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User record returned by the authentication service.
///
/// The relay treats this as an opaque payload: beyond deserializing the
/// document it performs no validation of the backend's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub role: String,
    pub tenant_id: i64,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login credentials accepted from the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload accepted from the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Optional identifier linking the account to an external system.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Outcome of one refresh attempt against the authentication service.
///
/// `Refreshed` carries every raw `Set-Cookie` value from the refresh
/// response, in response order. At most one outcome is produced per inbound
/// request.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(Vec<String>),
    NotRefreshed,
}

/// Response relayed back to the client from a pass-through backend call
/// (login, register, logout).
///
/// Only the status, body, content type and `Set-Cookie` values are carried:
/// the session cookies must reach the client's browser unmodified.
#[derive(Debug, Clone)]
pub struct PassthroughResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub set_cookies: Vec<String>,
    pub body: Bytes,
}
