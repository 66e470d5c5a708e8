// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token issuer tests.
//!
//! The issuer is stateless, so everything here runs without a database:
//! round trips, the three failure kinds, and the access/refresh
//! separation under both shared and distinct signing secrets.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use kinderwacht_auth::config::Config;
use kinderwacht_auth::services::{TokenError, TokenService};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

fn service() -> TokenService {
    TokenService::new(&Config::default())
}

#[test]
fn test_access_round_trip() {
    let service = service();
    let pair = service.issue_pair("acct-1").unwrap();

    let claims = service.verify_access(&pair.access_token).unwrap();
    assert_eq!(claims.sub, "acct-1");
    assert!(claims.exp > claims.iat);
    assert_eq!(
        pair.access_ttl_secs,
        (claims.exp - claims.iat) as i64,
        "Advertised lifetime must match the embedded expiry"
    );
}

#[test]
fn test_refresh_round_trip() {
    let service = service();
    let pair = service.issue_pair("acct-1").unwrap();

    let claims = service.verify_refresh(&pair.refresh_token).unwrap();
    assert_eq!(claims.sub, "acct-1");
    assert_eq!(claims.typ, "refresh");
}

#[test]
fn test_pair_tokens_are_distinct() {
    let service = service();
    let pair = service.issue_pair("acct-1").unwrap();
    assert_ne!(pair.access_token, pair.refresh_token);
}

#[test]
fn test_rapid_reissue_mints_distinct_tokens() {
    // Issuing twice within the same second must not produce identical
    // tokens; the nonce carries the distinction.
    let service = service();
    let first = service.issue_pair("acct-1").unwrap();
    let second = service.issue_pair("acct-1").unwrap();

    assert_ne!(first.access_token, second.access_token);
    assert_ne!(first.refresh_token, second.refresh_token);
}

#[test]
fn test_garbage_is_malformed() {
    let service = service();
    assert_eq!(
        service.verify_access("not.a.token").unwrap_err(),
        TokenError::Malformed
    );
    assert_eq!(
        service.verify_refresh("").unwrap_err(),
        TokenError::Malformed
    );
}

#[test]
fn test_foreign_signature_is_invalid() {
    let service = service();

    let mut other_config = Config::default();
    other_config.jwt_secret = b"a_completely_different_secret!!!".to_vec();
    other_config.jwt_refresh_secret = other_config.jwt_secret.clone();
    let other = TokenService::new(&other_config);

    let pair = other.issue_pair("acct-1").unwrap();
    assert_eq!(
        service.verify_access(&pair.access_token).unwrap_err(),
        TokenError::InvalidSignature
    );
    assert_eq!(
        service.verify_refresh(&pair.refresh_token).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn test_expired_token_is_classified_expired() {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        sid: i64,
        exp: usize,
        iat: usize,
    }

    let config = Config::default();
    let service = TokenService::new(&config);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: "acct-1".to_string(),
        sid: 7,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.jwt_secret),
    )
    .unwrap();

    assert_eq!(
        service.verify_access(&token).unwrap_err(),
        TokenError::Expired
    );
}

#[test]
fn test_access_token_is_not_a_refresh_token() {
    // Distinct refresh secret (the test default): the signature check
    // rejects it first.
    let service = service();
    let pair = service.issue_pair("acct-1").unwrap();
    assert_eq!(
        service.verify_refresh(&pair.access_token).unwrap_err(),
        TokenError::InvalidSignature
    );

    // Shared secret: the claim shape still keeps the kinds apart.
    let mut config = Config::default();
    config.jwt_refresh_secret = config.jwt_secret.clone();
    let service = TokenService::new(&config);
    let pair = service.issue_pair("acct-1").unwrap();
    assert_eq!(
        service.verify_refresh(&pair.access_token).unwrap_err(),
        TokenError::Malformed
    );
}

#[test]
fn test_refresh_token_is_not_an_access_token() {
    let mut config = Config::default();
    config.jwt_refresh_secret = config.jwt_secret.clone();
    let service = TokenService::new(&config);

    let pair = service.issue_pair("acct-1").unwrap();
    assert_eq!(
        service.verify_access(&pair.refresh_token).unwrap_err(),
        TokenError::Malformed
    );
}
