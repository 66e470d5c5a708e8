// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: registration, verification, authentication, and the
//! administrative block protocol.
//!
//! Handles:
//! - Registration with OTP delivery and compensating rollback
//! - OTP verification and re-issue
//! - Login checks in the order existence, block, verification, password
//! - Password reset (invalidates every session on success)
//! - Block/unblock with the eager session cascade

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::{AppError, BlockDetails};
use crate::models::{account::compute_completeness, Account};
use crate::services::EmailService;
use crate::time_utils::{format_utc_rfc3339, now_rfc3339, parse_utc_rfc3339};

/// Input for a new registration, already validated at the route.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Account lifecycle service over the `accounts` collection.
#[derive(Clone)]
pub struct AccountService {
    db: FirestoreDb,
    email: EmailService,
    config: Config,
}

impl AccountService {
    pub fn new(db: FirestoreDb, email: EmailService, config: Config) -> Self {
        Self { db, email, config }
    }

    // ─── Registration & Verification ─────────────────────────────

    /// Create an unverified account and deliver its OTP.
    ///
    /// If delivery fails after all retries, the just-created account is
    /// deleted again so unreachable unverified accounts never accumulate.
    pub async fn register(&self, new: NewAccount) -> Result<Account, AppError> {
        if self
            .db
            .find_account_by_username(&new.username)
            .await?
            .is_some()
            || self.db.find_account_by_email(&new.email).await?.is_some()
        {
            return Err(AppError::DuplicateIdentity);
        }

        let password_hash = hash_password(&new.password)?;
        let otp = generate_otp();
        let now = Utc::now();

        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: new.username,
            email: new.email,
            password_hash,
            is_verified: false,
            otp: Some(otp.clone()),
            otp_expires: Some(format_utc_rfc3339(
                now + Duration::minutes(self.config.otp_ttl_minutes),
            )),
            is_blocked: false,
            block_reason: None,
            blocked_at: None,
            blocked_by: None,
            is_admin: false,
            login_count: 0,
            profile_completeness: compute_completeness(
                new.full_name.as_deref(),
                new.phone.as_deref(),
                new.address.as_deref(),
            ),
            full_name: new.full_name,
            phone: new.phone,
            address: new.address,
            created_at: format_utc_rfc3339(now),
            last_login: None,
        };

        self.db.upsert_account(&account).await?;

        if let Err(delivery_err) = self
            .email
            .send_otp_email(&account.email, &account.username, &otp)
            .await
        {
            // Without its code the account can never be verified; remove it.
            if let Err(e) = self.db.delete_account(&account.id).await {
                tracing::error!(
                    account_id = %account.id,
                    error = %e,
                    "Failed to roll back account after delivery failure"
                );
            }
            return Err(delivery_err);
        }

        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "Account registered, verification code sent"
        );
        Ok(account)
    }

    /// Consume a verification code. Verifying an already-verified account
    /// is a no-op success.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<Account, AppError> {
        let mut account = self
            .db
            .find_account_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        if account.is_verified {
            return Ok(account);
        }

        match &account.otp {
            Some(stored) if stored == code => {}
            _ => return Err(AppError::InvalidCode),
        }
        if otp_expired(account.otp_expires.as_deref()) {
            return Err(AppError::CodeExpired);
        }

        account.is_verified = true;
        account.otp = None;
        account.otp_expires = None;
        self.db.mark_account_verified(&account).await?;

        tracing::info!(account_id = %account.id, "Account verified");
        Ok(account)
    }

    /// Issue a fresh verification code. Already-verified accounts get a
    /// no-op success and no mail.
    pub async fn resend_otp(&self, email: &str) -> Result<Account, AppError> {
        let mut account = self
            .db
            .find_account_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        if account.is_verified {
            return Ok(account);
        }

        let otp = generate_otp();
        account.otp = Some(otp.clone());
        account.otp_expires = Some(format_utc_rfc3339(
            Utc::now() + Duration::minutes(self.config.otp_ttl_minutes),
        ));
        self.db.set_account_otp(&account).await?;

        self.email
            .send_otp_email(&account.email, &account.username, &otp)
            .await?;

        tracing::info!(account_id = %account.id, "Verification code re-issued");
        Ok(account)
    }

    // ─── Authentication ──────────────────────────────────────────

    /// Authenticate by username or email.
    ///
    /// Block state is checked before the password so a blocked caller
    /// learns nothing about whether the password would have matched.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<Account, AppError> {
        let mut account = self
            .db
            .find_account_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        if account.is_blocked {
            tracing::warn!(account_id = %account.id, "Login attempt on blocked account");
            return Err(AppError::Blocked(block_details(
                &account,
                &self.config.support_email,
            )));
        }
        if !account.is_verified {
            return Err(AppError::NotVerified {
                email: account.email,
            });
        }
        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::InvalidCredential);
        }

        account.login_count += 1;
        account.last_login = Some(now_rfc3339());
        self.db.record_account_login(&account).await?;

        Ok(account)
    }

    // ─── Password Reset ──────────────────────────────────────────

    /// Issue a password-reset code for a verified, unblocked account.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let mut account = self
            .db
            .find_account_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        if account.is_blocked {
            return Err(AppError::Blocked(block_details(
                &account,
                &self.config.support_email,
            )));
        }
        if !account.is_verified {
            return Err(AppError::NotVerified {
                email: account.email,
            });
        }

        let otp = generate_otp();
        account.otp = Some(otp.clone());
        account.otp_expires = Some(format_utc_rfc3339(
            Utc::now() + Duration::minutes(self.config.otp_ttl_minutes),
        ));
        self.db.set_account_otp(&account).await?;

        self.email
            .send_reset_email(&account.email, &account.username, &otp)
            .await?;

        tracing::info!(account_id = %account.id, "Password reset code sent");
        Ok(())
    }

    /// Consume a reset code and install a new password. Every session of
    /// the account is invalidated; a credential change forces re-login.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut account = self
            .db
            .find_account_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        match &account.otp {
            Some(stored) if stored == code => {}
            _ => return Err(AppError::InvalidCode),
        }
        if otp_expired(account.otp_expires.as_deref()) {
            return Err(AppError::CodeExpired);
        }

        account.password_hash = hash_password(new_password)?;
        account.otp = None;
        account.otp_expires = None;
        self.db.set_account_password(&account).await?;

        let invalidated = self.db.invalidate_all_for_account(&account.id).await?;
        tracing::info!(
            account_id = %account.id,
            invalidated,
            "Password reset, sessions invalidated"
        );
        Ok(())
    }

    // ─── Block Protocol ──────────────────────────────────────────

    /// Block an account and eagerly invalidate every live session.
    ///
    /// The gate also rejects blocked accounts on its own, so a failure in
    /// the cascade here cannot let a blocked session keep working.
    pub async fn set_blocked(
        &self,
        account_id: &str,
        reason: &str,
        admin_id: &str,
    ) -> Result<Account, AppError> {
        let mut account = self
            .db
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        if account.is_blocked {
            return Err(AppError::AlreadyBlocked);
        }

        account.is_blocked = true;
        account.block_reason = Some(reason.to_string());
        account.blocked_at = Some(now_rfc3339());
        account.blocked_by = Some(admin_id.to_string());
        self.db.set_account_block_state(&account).await?;

        let invalidated = self.db.invalidate_all_for_account(&account.id).await?;

        tracing::warn!(
            account_id = %account.id,
            blocked_by = %admin_id,
            invalidated,
            "Account blocked, sessions invalidated"
        );
        Ok(account)
    }

    /// Clear block state. The four fields change in one write; prior
    /// sessions stay dead and the account must log in again.
    pub async fn set_unblocked(&self, account_id: &str) -> Result<Account, AppError> {
        let mut account = self
            .db
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        if !account.is_blocked {
            return Err(AppError::NotBlocked);
        }

        account.is_blocked = false;
        account.block_reason = None;
        account.blocked_at = None;
        account.blocked_by = None;
        self.db.set_account_block_state(&account).await?;

        tracing::info!(account_id = %account.id, "Account unblocked");
        Ok(account)
    }
}

/// Block payload for the 403 body, built from the account's block fields.
pub fn block_details(account: &Account, support_email: &str) -> BlockDetails {
    BlockDetails {
        reason: account.block_reason.clone(),
        blocked_at: account.blocked_at.clone(),
        blocked_by: account.blocked_by.clone(),
        support_email: support_email.to_string(),
    }
}

/// A missing or unparseable expiry counts as expired.
fn otp_expired(otp_expires: Option<&str>) -> bool {
    match otp_expires.and_then(parse_utc_rfc3339) {
        Some(expires) => Utc::now() > expires,
        None => true,
    }
}

/// Six random decimal digits, zero-padding never needed.
fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored hash unreadable: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
        // Salted: hashing twice never repeats
        assert_ne!(hash, hash_password("secret1").unwrap());
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn missing_or_bad_expiry_counts_as_expired() {
        assert!(otp_expired(None));
        assert!(otp_expired(Some("garbage")));
        assert!(otp_expired(Some("2020-01-01T00:00:00Z")));
        let future = format_utc_rfc3339(Utc::now() + Duration::minutes(15));
        assert!(!otp_expired(Some(&future)));
    }
}
