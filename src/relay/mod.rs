// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Core
//!
//! The verify-then-refresh-then-replay protocol.
//!
//! [`request::RelayRequest`] is the immutable snapshot of an inbound request;
//! replaying derives a new value with refreshed cookies, never mutating the
//! original. [`orchestrator::RefreshOrchestrator`] owns the retry bound: at
//! most one refresh attempt and one replay per inbound request.

pub mod orchestrator;
pub mod request;

pub use orchestrator::{AuthDecision, RefreshOrchestrator};
pub use request::RelayRequest;
