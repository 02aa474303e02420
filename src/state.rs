// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::backend::AuthBackend;
use crate::upstream::Forwarder;

/// Shared application state.
///
/// Both collaborators are stateless between requests; there is no session
/// cache or token store, so concurrent requests never contend on anything
/// here.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn AuthBackend>,
    pub forwarder: Arc<dyn Forwarder>,
}

impl AppState {
    pub fn new(backend: Arc<dyn AuthBackend>, forwarder: Arc<dyn Forwarder>) -> Self {
        Self { backend, forwarder }
    }
}
