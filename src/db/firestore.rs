// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Accounts (credentials, verification, block state)
//! - Sessions (per-device login rows with embedded token pair)
//! - Emergency contacts (access-gated records)
//!
//! Every persisted timestamp is an RFC3339 string produced by
//! [`crate::time_utils::format_utc_rfc3339`], so the range filters below
//! compare strings and still mean "before"/"after".

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Account, EmergencyContact, Session};
use crate::time_utils::now_rfc3339;
use futures_util::{stream, FutureExt, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Account Operations ──────────────────────────────────────

    /// Get an account by its document ID.
    pub async fn get_account(&self, account_id: &str) -> Result<Option<Account>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACCOUNTS)
            .obj()
            .one(account_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by email address.
    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let email = email.to_string();
        let matches: Vec<Account> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACCOUNTS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(matches.into_iter().next())
    }

    /// Find an account by username.
    pub async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let username = username.to_string();
        let matches: Vec<Account> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACCOUNTS)
            .filter(move |q| q.field("username").eq(username.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(matches.into_iter().next())
    }

    /// Find an account by username or email (login identifier).
    pub async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AppError> {
        if let Some(account) = self.find_account_by_username(identifier).await? {
            return Ok(Some(account));
        }
        self.find_account_by_email(identifier).await
    }

    /// Persist a new account (or overwrite an existing one wholesale).
    pub async fn upsert_account(&self, account: &Account) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACCOUNTS)
            .document_id(&account.id)
            .object(account)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only the OTP pair. Used when issuing or re-issuing a code.
    pub async fn set_account_otp(&self, account: &Account) -> Result<(), AppError> {
        self.update_account_fields(account, firestore::paths!(Account::{otp, otp_expires}))
            .await
    }

    /// Mark verified and clear the OTP pair in the same write.
    pub async fn mark_account_verified(&self, account: &Account) -> Result<(), AppError> {
        self.update_account_fields(
            account,
            firestore::paths!(Account::{is_verified, otp, otp_expires}),
        )
        .await
    }

    /// Replace the password hash and clear the reset code in the same write.
    pub async fn set_account_password(&self, account: &Account) -> Result<(), AppError> {
        self.update_account_fields(
            account,
            firestore::paths!(Account::{password_hash, otp, otp_expires}),
        )
        .await
    }

    /// Record a successful login (counter + timestamp).
    pub async fn record_account_login(&self, account: &Account) -> Result<(), AppError> {
        self.update_account_fields(account, firestore::paths!(Account::{login_count, last_login}))
            .await
    }

    /// Write the four block fields in one update so they change together.
    pub async fn set_account_block_state(&self, account: &Account) -> Result<(), AppError> {
        self.update_account_fields(
            account,
            firestore::paths!(Account::{is_blocked, block_reason, blocked_at, blocked_by}),
        )
        .await
    }

    /// Update the editable profile fields and the recomputed completeness.
    pub async fn update_account_profile(&self, account: &Account) -> Result<(), AppError> {
        self.update_account_fields(
            account,
            firestore::paths!(Account::{full_name, phone, address, profile_completeness}),
        )
        .await
    }

    /// Delete an account document. Compensating action when OTP delivery
    /// fails right after registration.
    pub async fn delete_account(&self, account_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACCOUNTS)
            .document_id(account_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Masked account update: only the named fields are written.
    async fn update_account_fields(
        &self,
        account: &Account,
        fields: Vec<String>,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::ACCOUNTS)
            .document_id(&account.id)
            .object(account)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Persist a new session row.
    pub async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a session by its document ID, regardless of state.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(session_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the active, unexpired session holding this access token.
    ///
    /// Inactive or expired rows behave as not-found here; this query is the
    /// authority the gate relies on.
    pub async fn find_session_by_token(
        &self,
        account_id: &str,
        session_token: &str,
    ) -> Result<Option<Session>, AppError> {
        self.find_live_session(account_id, "session_token", session_token)
            .await
    }

    /// Find the active, unexpired session holding this refresh token.
    pub async fn find_session_by_refresh(
        &self,
        account_id: &str,
        refresh_token: &str,
    ) -> Result<Option<Session>, AppError> {
        self.find_live_session(account_id, "refresh_token", refresh_token)
            .await
    }

    async fn find_live_session(
        &self,
        account_id: &str,
        token_field: &'static str,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        let account_id = account_id.to_string();
        let token = token.to_string();
        let now = now_rfc3339();
        let matches: Vec<Session> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("account_id").eq(account_id.clone()),
                    q.field(token_field).eq(token.clone()),
                    q.field("is_active").eq(true),
                    q.field("expires_at").greater_than(now.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(matches.into_iter().next())
    }

    /// Update only `last_activity`. The mask keeps a concurrent refresh from
    /// being clobbered by a stale in-memory session.
    pub async fn touch_session(&self, session: &Session) -> Result<(), AppError> {
        self.update_session_fields(session, firestore::paths!(Session::{last_activity}))
            .await
    }

    /// Write `is_active` only. Idempotent; flipping an already-inactive row
    /// is a no-op success.
    pub async fn set_session_inactive(&self, session: &Session) -> Result<(), AppError> {
        self.update_session_fields(session, firestore::paths!(Session::{is_active}))
            .await
    }

    /// Invalidate every active session of an account.
    ///
    /// N independent single-row updates; each one is individually safe, so
    /// partial failure just leaves rows for the gate to reject later.
    pub async fn invalidate_all_for_account(&self, account_id: &str) -> Result<usize, AppError> {
        let sessions = self.all_active_rows(account_id).await?;
        let count = sessions.len();

        stream::iter(sessions)
            .map(|mut session| async move {
                session.is_active = false;
                self.set_session_inactive(&session).await
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(count)
    }

    /// Every `is_active` row for the account, expired ones included. The
    /// block cascade flips these wholesale; expiry filtering would leave
    /// stale-but-active rows behind.
    async fn all_active_rows(&self, account_id: &str) -> Result<Vec<Session>, AppError> {
        let account_id = account_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("account_id").eq(account_id.clone()),
                    q.field("is_active").eq(true),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active, unexpired sessions for display, most recently used first.
    pub async fn list_active_sessions(&self, account_id: &str) -> Result<Vec<Session>, AppError> {
        let account_id = account_id.to_string();
        let now = now_rfc3339();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("account_id").eq(account_id.clone()),
                    q.field("is_active").eq(true),
                    q.field("expires_at").greater_than(now.clone()),
                ])
            })
            .order_by([(
                "last_activity",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically rotate the token pair on a session row.
    ///
    /// The session passed in already carries the new tokens, expiry, and
    /// activity stamp; `expected_refresh` is the refresh token the caller
    /// matched on. The row is re-read inside the transaction and the write
    /// only applied while it is still active and still holds that refresh
    /// token. On contention the transaction retries against the winner's
    /// write and returns `false`, so a concurrent refresh with the same
    /// token cannot succeed twice.
    pub async fn rotate_session_tokens(
        &self,
        session: &Session,
        expected_refresh: &str,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;
        let rotated = session.clone();
        let expected = expected_refresh.to_string();

        client
            .run_transaction(move |db, transaction| {
                let rotated = rotated.clone();
                let expected = expected.clone();
                async move {
                    let current: Option<Session> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::SESSIONS)
                        .obj()
                        .one(&rotated.id)
                        .await?;

                    let still_matches = current
                        .as_ref()
                        .map(|s| s.is_active && s.refresh_token == expected)
                        .unwrap_or(false);
                    if !still_matches {
                        return Ok(false);
                    }

                    db.fluent()
                        .update()
                        .fields(firestore::paths!(Session::{
                            session_token,
                            refresh_token,
                            expires_at,
                            last_activity
                        }))
                        .in_col(collections::SESSIONS)
                        .document_id(&rotated.id)
                        .object(&rotated)
                        .add_to_transaction(transaction)?;

                    Ok(true)
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Session rotation failed: {}", e)))
    }

    /// Delete session rows whose expiry has passed. Cleanup only; the
    /// live-session queries already filter these out.
    pub async fn delete_expired_sessions(&self) -> Result<usize, AppError> {
        let now = now_rfc3339();
        let expired: Vec<Session> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.field("expires_at").less_than_or_equal(now.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = expired.len();
        self.batch_delete(&expired, collections::SESSIONS, |session: &Session| {
            session.id.clone()
        })
        .await?;

        Ok(count)
    }

    /// Masked session update: only the named fields are written.
    async fn update_session_fields(
        &self,
        session: &Session,
        fields: Vec<String>,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Emergency Contact Operations ────────────────────────────

    /// Persist a contact record.
    pub async fn upsert_contact(&self, contact: &EmergencyContact) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EMERGENCY_CONTACTS)
            .document_id(&contact.id)
            .object(contact)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a contact by its document ID.
    pub async fn get_contact(&self, contact_id: &str) -> Result<Option<EmergencyContact>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EMERGENCY_CONTACTS)
            .obj()
            .one(contact_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All contacts owned by an account, newest first.
    pub async fn list_contacts(&self, account_id: &str) -> Result<Vec<EmergencyContact>, AppError> {
        let account_id = account_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EMERGENCY_CONTACTS)
            .filter(move |q| q.field("account_id").eq(account_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a contact record.
    pub async fn delete_contact(&self, contact_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::EMERGENCY_CONTACTS)
            .document_id(contact_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
