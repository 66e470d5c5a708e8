// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use kinderwacht_auth::config::Config;
use kinderwacht_auth::db::FirestoreDb;
use kinderwacht_auth::routes::create_router;
use kinderwacht_auth::services::{AccountService, EmailService, SessionService, TokenService};
use kinderwacht_auth::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build the full service stack over the given database. SMTP is never
/// configured in tests, so mail delivery is a logged no-op.
#[allow(dead_code)]
pub fn test_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::default();
    let email = EmailService::new(&config).expect("Failed to build no-op email transport");
    let tokens = TokenService::new(&config);
    let accounts = AccountService::new(db.clone(), email, config.clone());
    let sessions = SessionService::new(db.clone(), tokens.clone(), config.clone());

    Arc::new(AppState {
        config,
        db,
        tokens,
        accounts,
        sessions,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db_offline());
    (create_router(state.clone()), state)
}
