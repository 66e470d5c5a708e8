// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kinderwacht Auth API Server
//!
//! Account, token, and session backend for the Kinderwacht baby-monitor
//! app: OTP registration, per-device sessions, token refresh, and the
//! admin block protocol.

use kinderwacht_auth::{
    config::Config,
    db::FirestoreDb,
    services::{AccountService, EmailService, SessionService, TokenService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Kinderwacht auth API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize email transport (disabled when SMTP_HOST is unset)
    let email = EmailService::new(&config).expect("Failed to initialize email transport");
    if !email.is_enabled() {
        tracing::warn!("SMTP not configured; verification mails are logged and dropped");
    }

    // Stateless token issuer
    let tokens = TokenService::new(&config);

    // Credential store and session registry
    let accounts = AccountService::new(db.clone(), email, config.clone());
    let sessions = SessionService::new(db.clone(), tokens.clone(), config.clone());

    // Background reaper deletes session rows past their expiry. The gate
    // filters expiry on every read, so this is cleanup, not enforcement.
    let reaper = sessions.clone();
    tokio::spawn(async move { reaper.run_reaper().await });

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        tokens,
        accounts,
        sessions,
    });

    // Build router
    let app = kinderwacht_auth::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kinderwacht_auth=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
