// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use session_relay::{
    api::router, backend::HttpAuthBackend, config::Config, state::AppState,
    upstream::HttpForwarder,
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = Config::from_env().expect("Configuration error");

    let backend = HttpAuthBackend::new(&config).expect("Failed to build auth backend client");
    let forwarder = HttpForwarder::new(&config).expect("Failed to build upstream forwarder");
    let state = AppState::new(Arc::new(backend), Arc::new(forwarder));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind listen address");

    info!(
        addr = %config.addr,
        auth = %config.auth_base_url,
        upstream = %config.upstream_base_url,
        "session relay listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}
