// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session gate middleware.
//!
//! Every protected request passes through [`require_session`], which checks
//! the bearer token, the session row, and the account state in a fixed
//! order so each failure mode maps to one distinct error shape.

use crate::error::AppError;
use crate::models::{Account, Session};
use crate::services::accounts::block_details;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Verified caller attached to the request after the gate passes.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: Account,
    pub session: Session,
}

/// Middleware admitting only live sessions of verified, unblocked accounts.
///
/// Check order matters: token validity before session state, session state
/// before account state. A caller with an expired token gets `expired`, not
/// a session error, so clients know to refresh instead of re-login.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify_access(&token)?;

    // The session row is the revocation authority. A cryptographically
    // valid token with no live row behind it is dead.
    let mut session = state
        .db
        .find_session_by_token(&claims.sub, &token)
        .await?
        .ok_or(AppError::SessionGone)?;

    let account = match state.db.get_account(&claims.sub).await? {
        Some(account) => account,
        None => {
            // Account deleted out from under a live session.
            session.is_active = false;
            if let Err(e) = state.db.set_session_inactive(&session).await {
                tracing::warn!(
                    session_id = %session.id,
                    error = %e,
                    "Failed to retire orphaned session"
                );
            }
            return Err(AppError::SessionGone);
        }
    };

    if !account.is_verified {
        return Err(AppError::NotVerified {
            email: account.email,
        });
    }

    if account.is_blocked {
        // Lazy half of block propagation: any surviving session that shows
        // up here is rejected and the rest are swept as a side effect.
        if let Err(e) = state.sessions.invalidate_all(&account.id).await {
            tracing::warn!(
                account_id = %account.id,
                error = %e,
                "Block cascade sweep failed"
            );
        }
        tracing::warn!(account_id = %account.id, "Blocked account rejected at gate");
        return Err(AppError::Blocked(block_details(
            &account,
            &state.config.support_email,
        )));
    }

    // Activity stamping is best-effort; an admitted request never fails on it.
    session.last_activity = now_rfc3339();
    if let Err(e) = state.db.touch_session(&session).await {
        tracing::warn!(session_id = %session.id, error = %e, "Failed to touch session");
    }

    request.extensions_mut().insert(AuthSession { account, session });
    Ok(next.run(request).await)
}

/// Middleware for admin-only routes. Runs after [`require_session`], so a
/// missing `AuthSession` means the route was wired without the gate.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthSession>() {
        Some(auth) if auth.account.is_admin => Ok(next.run(request).await),
        Some(_) => Err(AppError::Forbidden),
        None => Err(AppError::Unauthorized),
    }
}
