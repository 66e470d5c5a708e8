// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session registry: creation, refresh rotation, and invalidation.
//!
//! Refresh is the one contended path. A per-token in-process lock
//! serializes concurrent callers holding the same refresh token, and the
//! conditional rotation in Firestore backstops callers on other instances.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{DeviceInfo, Session};
use crate::services::{TokenPair, TokenService};
use crate::time_utils::format_utc_rfc3339;

/// One lock per outstanding refresh token, so two requests presenting the
/// same token line up instead of racing.
type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

#[derive(Clone)]
pub struct SessionService {
    db: FirestoreDb,
    tokens: TokenService,
    config: Config,
    refresh_locks: RefreshLocks,
}

impl SessionService {
    pub fn new(db: FirestoreDb, tokens: TokenService, config: Config) -> Self {
        Self {
            db,
            tokens,
            config,
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Open a session for an authenticated account. Login never touches
    /// other sessions; every device gets its own row.
    pub async fn create(
        &self,
        account_id: &str,
        device: DeviceInfo,
    ) -> Result<(Session, TokenPair), AppError> {
        let pair = self.tokens.issue_pair(account_id)?;
        let now = Utc::now();

        let session = Session {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            session_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            device_info: device,
            is_active: true,
            last_activity: format_utc_rfc3339(now),
            expires_at: format_utc_rfc3339(now + Duration::days(self.config.session_ttl_days)),
            created_at: format_utc_rfc3339(now),
        };
        self.db.create_session(&session).await?;

        tracing::info!(
            account_id = %account_id,
            session_id = %session.id,
            device = %session.device_info.device,
            browser = %session.device_info.browser,
            "Session created"
        );
        Ok((session, pair))
    }

    /// Rotate a refresh token into a fresh token pair.
    ///
    /// Exactly one caller per token wins. In-process racers queue on the
    /// token lock and then find the session no longer holds their token;
    /// cross-instance racers lose the conditional rotation instead. Both
    /// surface as `SessionGone`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(Session, TokenPair), AppError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let lock = self
            .refresh_locks
            .entry(refresh_token.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let session = match self
            .db
            .find_session_by_refresh(&claims.sub, refresh_token)
            .await?
        {
            Some(session) => session,
            None => {
                // Already rotated, invalidated, or expired. The token is
                // spent either way, so the lock entry can go too.
                self.refresh_locks.remove(refresh_token);
                return Err(AppError::SessionGone);
            }
        };

        let pair = self.tokens.issue_pair(&claims.sub)?;
        let now = Utc::now();

        let mut rotated = session;
        rotated.session_token = pair.access_token.clone();
        rotated.refresh_token = pair.refresh_token.clone();
        rotated.expires_at = format_utc_rfc3339(now + Duration::days(self.config.session_ttl_days));
        rotated.last_activity = format_utc_rfc3339(now);

        let committed = self
            .db
            .rotate_session_tokens(&rotated, refresh_token)
            .await?;
        self.refresh_locks.remove(refresh_token);
        if !committed {
            return Err(AppError::SessionGone);
        }

        tracing::info!(
            account_id = %rotated.account_id,
            session_id = %rotated.id,
            "Session tokens rotated"
        );
        Ok((rotated, pair))
    }

    /// Log out one session. Idempotent.
    pub async fn invalidate(&self, session: &Session) -> Result<(), AppError> {
        let mut dead = session.clone();
        dead.is_active = false;
        self.db.set_session_inactive(&dead).await?;

        tracing::info!(
            account_id = %session.account_id,
            session_id = %session.id,
            "Session invalidated"
        );
        Ok(())
    }

    /// Invalidate a session by id, but only if the account owns it. A
    /// session belonging to someone else looks exactly like a missing one.
    pub async fn invalidate_by_owner(
        &self,
        session_id: &str,
        account_id: &str,
    ) -> Result<(), AppError> {
        let session = self
            .db
            .get_session(session_id)
            .await?
            .filter(|s| s.account_id == account_id)
            .ok_or_else(|| AppError::NotFound("Session".to_string()))?;
        self.invalidate(&session).await
    }

    /// Invalidate every session of an account. Returns how many flipped.
    pub async fn invalidate_all(&self, account_id: &str) -> Result<usize, AppError> {
        let count = self.db.invalidate_all_for_account(account_id).await?;
        tracing::info!(account_id = %account_id, count, "All sessions invalidated");
        Ok(count)
    }

    /// Active, unexpired sessions, most recently used first.
    pub async fn list_active(&self, account_id: &str) -> Result<Vec<Session>, AppError> {
        self.db.list_active_sessions(account_id).await
    }

    /// Periodic sweep deleting expired session rows. Expired rows are
    /// already invisible to every query; this only reclaims storage.
    pub async fn run_reaper(self) {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.config.reaper_interval_secs));
        loop {
            interval.tick().await;
            match self.db.delete_expired_sessions().await {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::info!(deleted, "Reaped expired sessions");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Session reaper sweep failed");
                }
            }
        }
    }
}
