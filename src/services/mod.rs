// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod email;
pub mod sessions;
pub mod tokens;

pub use accounts::{AccountService, NewAccount};
pub use email::EmailService;
pub use sessions::SessionService;
pub use tokens::{AccessClaims, RefreshClaims, TokenError, TokenPair, TokenService};
