// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session Relay - Credential Relay Service
//!
//! This crate sits between application servers and the remote authentication
//! service. Inbound requests carry session credentials as cookies; the relay
//! verifies them against the authentication service and, when they are
//! rejected, performs exactly one silent refresh before replaying the request.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `backend` - Authentication service client (reqwest)
//! - `cookies` - Cookie header codec
//! - `relay` - Request replay and the refresh orchestrator
//! - `upstream` - Forwarding proxied requests to the application upstream

pub mod api;
pub mod backend;
pub mod config;
pub mod cookies;
pub mod error;
pub mod models;
pub mod relay;
pub mod state;
pub mod upstream;
