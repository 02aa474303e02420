// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. Missing required
//! values fail startup; empty values are treated as missing.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RELAY_AUTH_BASE_URL` | Base URL of the authentication service | Required |
//! | `RELAY_UPSTREAM_BASE_URL` | Base URL proxied requests are forwarded to | Required |
//! | `RELAY_TENANT_ID` | Tenant identifier injected into login/register calls | Required |
//! | `RELAY_BACKEND_TIMEOUT_SECS` | Timeout for calls to the authentication service | `15` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Environment variable for the authentication service base URL.
pub const AUTH_BASE_URL_ENV: &str = "RELAY_AUTH_BASE_URL";

/// Environment variable for the upstream application base URL.
pub const UPSTREAM_BASE_URL_ENV: &str = "RELAY_UPSTREAM_BASE_URL";

/// Environment variable for the tenant identifier.
pub const TENANT_ID_ENV: &str = "RELAY_TENANT_ID";

/// Environment variable for the authentication service call timeout.
pub const BACKEND_TIMEOUT_ENV: &str = "RELAY_BACKEND_TIMEOUT_SECS";

const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Runtime configuration for the relay.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Base URL of the authentication service (no trailing slash).
    pub auth_base_url: String,
    /// Base URL proxied requests are forwarded to (no trailing slash).
    pub upstream_base_url: String,
    /// Tenant identifier injected into login/register pass-through bodies.
    pub tenant_id: i64,
    /// Timeout applied to every outbound HTTP call.
    pub backend_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", "0.0.0.0");
        let port = env_or_default("PORT", "8080");
        let addr = SocketAddr::from_str(&format!("{host}:{port}"))
            .map_err(|_| ConfigError::Invalid("HOST/PORT"))?;

        let auth_base_url = validate_base_url(
            &env_required(AUTH_BASE_URL_ENV)?,
            AUTH_BASE_URL_ENV,
        )?;
        let upstream_base_url = validate_base_url(
            &env_required(UPSTREAM_BASE_URL_ENV)?,
            UPSTREAM_BASE_URL_ENV,
        )?;

        let tenant_id: i64 = env_required(TENANT_ID_ENV)?
            .parse()
            .map_err(|_| ConfigError::Invalid(TENANT_ID_ENV))?;

        let timeout_secs: u64 = match env_optional(BACKEND_TIMEOUT_ENV) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid(BACKEND_TIMEOUT_ENV))?,
            None => DEFAULT_BACKEND_TIMEOUT_SECS,
        };

        Ok(Self {
            addr,
            auth_base_url,
            upstream_base_url,
            tenant_id,
            backend_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Validate that a configured base URL parses and normalize it by trimming
/// any trailing slash, so paths can be appended verbatim.
fn validate_base_url(raw: &str, key: &'static str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::Invalid(key))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(key));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    env_optional(name).ok_or(ConfigError::Missing(name))
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}
