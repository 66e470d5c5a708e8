// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error envelope tests.
//!
//! Clients branch on the flags in the JSON body, so every failure kind
//! must map to exactly one status plus one flag combination.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use kinderwacht_auth::error::{AppError, BlockDetails};
use serde_json::Value;

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_unauthorized_envelope() {
    let (status, body) = render(AppError::Unauthorized).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["requiresAuth"], true);
    assert_eq!(body["error"], "Access denied. No session token provided.");
    assert!(body.get("expired").is_none());
    assert!(body.get("blocked").is_none());
}

#[tokio::test]
async fn test_expired_token_envelope() {
    let (status, body) = render(AppError::TokenExpired).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["requiresAuth"], true);
    assert_eq!(body["expired"], true);
}

#[tokio::test]
async fn test_invalid_token_has_no_expired_flag() {
    let (status, body) = render(AppError::TokenInvalid).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["requiresAuth"], true);
    // Invalid means re-login, not refresh
    assert!(body.get("expired").is_none());
}

#[tokio::test]
async fn test_session_gone_envelope() {
    let (status, body) = render(AppError::SessionGone).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["requiresAuth"], true);
    assert_eq!(
        body["error"],
        "Session not found or expired. Please login again."
    );
}

#[tokio::test]
async fn test_not_verified_surfaces_email() {
    let (status, body) = render(AppError::NotVerified {
        email: "alice@example.com".to_string(),
    })
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["needsVerification"], true);
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_blocked_envelope_full() {
    let (status, body) = render(AppError::Blocked(BlockDetails {
        reason: Some("policy violation".to_string()),
        blocked_at: Some("2026-08-01T10:00:00Z".to_string()),
        blocked_by: Some("admin-1".to_string()),
        support_email: "kinderkare@support.ac.in".to_string(),
    }))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["blocked"], true);
    assert_eq!(body["forceLogout"], true);
    assert_eq!(body["contactSupport"], true);
    assert_eq!(body["reason"], "policy violation");
    assert_eq!(body["blockedAt"], "2026-08-01T10:00:00Z");
    assert_eq!(body["blockedBy"], "admin-1");
    assert_eq!(body["supportEmail"], "kinderkare@support.ac.in");
    assert_eq!(
        body["supportMessage"],
        "Contact support to resolve this issue"
    );
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("kinderkare@support.ac.in"));
}

#[tokio::test]
async fn test_blocked_envelope_without_reason() {
    let (status, body) = render(AppError::Blocked(BlockDetails {
        support_email: "kinderkare@support.ac.in".to_string(),
        ..Default::default()
    }))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["blocked"], true);
    // Absent block bookkeeping is omitted, not null
    assert!(body.get("reason").is_none());
    assert!(body.get("blockedAt").is_none());
    assert!(body.get("blockedBy").is_none());
}

#[tokio::test]
async fn test_block_idempotency_conflicts() {
    let (status, _) = render(AppError::AlreadyBlocked).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = render(AppError::NotBlocked).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_identity_conflict() {
    let (status, body) = render(AppError::DuplicateIdentity).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "User already registered with this email or username"
    );
}

#[tokio::test]
async fn test_otp_envelopes() {
    let (status, body) = render(AppError::InvalidCode).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("expired").is_none());

    let (status, body) = render(AppError::CodeExpired).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["expired"], true);
}

#[tokio::test]
async fn test_invalid_credential_is_unauthorized() {
    let (status, _) = render(AppError::InvalidCredential).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forbidden_is_plain() {
    let (status, body) = render(AppError::Forbidden).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
    assert!(body.get("blocked").is_none());
}

#[tokio::test]
async fn test_not_found_names_the_resource() {
    let (status, body) = render(AppError::NotFound("Session".to_string())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Session not found");
}

#[tokio::test]
async fn test_database_errors_never_leak_internals() {
    let (status, body) =
        render(AppError::Database("connection refused at 10.1.2.3".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_delivery_failure_envelope() {
    let (status, body) = render(AppError::Delivery("smtp timeout".to_string())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Failed to send verification email. Please try registering again."
    );
}
