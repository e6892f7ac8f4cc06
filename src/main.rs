// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use streamgate::api;
use streamgate::auth::providers::{DiscordVerifier, GoogleVerifier, ProviderRegistry};
use streamgate::auth::service::AuthService;
use streamgate::auth::signature::SignatureVerifier;
use streamgate::auth::tokens::TokenService;
use streamgate::config::{Config, LOG_FORMAT_ENV};
use streamgate::notify::TracingMailSink;
use streamgate::state::AppState;
use streamgate::storage::InMemoryUserDirectory;
use streamgate::store::{RedisStore, SessionStore};

#[tokio::main]
async fn main() {
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Configuration error");
            std::process::exit(1);
        }
    };

    let sessions: Arc<dyn SessionStore> = match RedisStore::connect(&config.redis_url).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(error = %err, "Session store connection failed");
            std::process::exit(1);
        }
    };
    tracing::info!("Session store connected");

    let tokens = Arc::new(TokenService::new(&config.token_secrets));
    let signatures = Arc::new(SignatureVerifier::new(
        Arc::new(config.signing_keys.clone()),
        sessions.clone(),
    ));
    let providers = ProviderRegistry::new(
        Arc::new(GoogleVerifier::new(&config.google_client_id)),
        Arc::new(DiscordVerifier::new()),
    );
    let auth = AuthService::new(
        tokens.clone(),
        sessions.clone(),
        Arc::new(InMemoryUserDirectory::new()),
        providers,
        Arc::new(TracingMailSink),
        &config.frontend_url,
    );

    let state = AppState::new(auth, tokens, signatures, sessions, config.cookie_secure);
    let app = api::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        host = %config.host,
        port = config.port,
        "StreamGate listening (docs at /docs)"
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Initialize tracing before anything else can log.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
