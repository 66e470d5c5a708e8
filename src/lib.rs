// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kinderwacht auth: session and access control for the baby-monitor app
//!
//! This crate provides the account, token, and session backend: OTP-based
//! registration, login with per-device session rows, token refresh, and the
//! admin block protocol that invalidates every live session of an account.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AccountService, SessionService, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub sessions: SessionService,
}
