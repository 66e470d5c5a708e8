// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stateless token issuance and verification.
//!
//! Mints the signed access/refresh pair embedded in every session row and
//! classifies verification failures into the three kinds callers branch
//! on. No session lookups happen here.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

/// Marker value carried in refresh-token claims.
const REFRESH_MARKER: &str = "refresh";

/// Access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Issuance nonce; keeps tokens distinct even in the same second
    pub sid: i64,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Refresh token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Distinguishing marker, always "refresh"
    pub typ: String,
    /// Token id; two sessions opened in the same second must still get
    /// distinct refresh tokens
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Why a token failed verification. `Expired` tells the client to attempt
/// a silent refresh; the other kinds mean re-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Malformed | TokenError::InvalidSignature => AppError::TokenInvalid,
        }
    }
}

/// A freshly minted pair plus the access-token lifetime in seconds.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_ttl_secs: i64,
}

/// Stateless issuer and verifier for both token kinds.
///
/// The refresh keys fall back to the access keys when no dedicated refresh
/// secret is configured; the `typ` marker still keeps the two kinds apart.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&config.jwt_secret),
            decoding: DecodingKey::from_secret(&config.jwt_secret),
            refresh_encoding: EncodingKey::from_secret(&config.jwt_refresh_secret),
            refresh_decoding: DecodingKey::from_secret(&config.jwt_refresh_secret),
            access_ttl_secs: config.session_ttl_days * 24 * 60 * 60,
            refresh_ttl_secs: config.refresh_ttl_days * 24 * 60 * 60,
        }
    }

    /// Mint a fresh access/refresh pair for an account.
    pub fn issue_pair(&self, account_id: &str) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;

        let access = AccessClaims {
            sub: account_id.to_string(),
            sid: rand::thread_rng().gen(),
            iat,
            exp: iat + self.access_ttl_secs as usize,
        };
        let refresh = RefreshClaims {
            sub: account_id.to_string(),
            typ: REFRESH_MARKER.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat + self.refresh_ttl_secs as usize,
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign access token: {}", e)))?;
        let refresh_token = encode(&header, &refresh, &self.refresh_encoding).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to sign refresh token: {}", e))
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_ttl_secs: self.access_ttl_secs,
        })
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AccessClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(classify)
    }

    /// Verify a refresh token. A structurally valid token without the
    /// refresh marker is rejected as malformed.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation)
            .map(|data| data.claims)
            .map_err(classify)?;

        if claims.typ != REFRESH_MARKER {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }
}

/// Map jsonwebtoken failures onto the three caller-visible kinds.
fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}
