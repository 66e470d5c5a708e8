// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Clients branch on the machine-checkable flags in the body (`requiresAuth`,
//! `expired`, `blocked`, `needsVerification`, `forceLogout`), not on the HTTP
//! status alone.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Access denied. No session token provided.")]
    Unauthorized,

    #[error("Session token expired. Please refresh your session or login again.")]
    TokenExpired,

    #[error("Invalid session token. Please login again.")]
    TokenInvalid,

    #[error("Session not found or expired. Please login again.")]
    SessionGone,

    #[error("Please verify your email first")]
    NotVerified { email: String },

    #[error("Account blocked by admin")]
    Blocked(BlockDetails),

    #[error("Admin access required")]
    Forbidden,

    #[error("User already registered with this email or username")]
    DuplicateIdentity,

    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Invalid OTP")]
    InvalidCode,

    #[error("OTP has expired. Please request a new one.")]
    CodeExpired,

    #[error("User is already blocked")]
    AlreadyBlocked,

    #[error("User is not blocked")]
    NotBlocked,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Block context surfaced to the client alongside the `blocked` flag.
#[derive(Debug, Clone, Default)]
pub struct BlockDetails {
    pub reason: Option<String>,
    pub blocked_at: Option<String>,
    pub blocked_by: Option<String>,
    pub support_email: String,
}

/// JSON error response body
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "is_false")]
    requires_auth: bool,
    #[serde(skip_serializing_if = "is_false")]
    expired: bool,
    #[serde(skip_serializing_if = "is_false")]
    blocked: bool,
    #[serde(skip_serializing_if = "is_false")]
    needs_verification: bool,
    #[serde(skip_serializing_if = "is_false")]
    force_logout: bool,
    #[serde(skip_serializing_if = "is_false")]
    contact_support: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    support_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    support_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = ErrorResponse {
            success: false,
            error: self.to_string(),
            ..Default::default()
        };

        let status = match self {
            AppError::Unauthorized => {
                body.requires_auth = true;
                StatusCode::UNAUTHORIZED
            }
            AppError::TokenExpired => {
                body.requires_auth = true;
                body.expired = true;
                StatusCode::UNAUTHORIZED
            }
            AppError::TokenInvalid => {
                body.requires_auth = true;
                StatusCode::UNAUTHORIZED
            }
            AppError::SessionGone => {
                body.requires_auth = true;
                StatusCode::UNAUTHORIZED
            }
            AppError::NotVerified { email } => {
                body.needs_verification = true;
                body.email = Some(email);
                StatusCode::FORBIDDEN
            }
            AppError::Blocked(details) => {
                body.error = format!(
                    "You were blocked by admin. For further information please contact \"{}\"",
                    details.support_email
                );
                body.blocked = true;
                body.force_logout = true;
                body.contact_support = true;
                body.reason = details.reason;
                body.blocked_at = details.blocked_at;
                body.blocked_by = details.blocked_by;
                body.support_message = Some("Contact support to resolve this issue".to_string());
                body.support_email = Some(details.support_email);
                StatusCode::FORBIDDEN
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateIdentity => StatusCode::CONFLICT,
            AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::InvalidCode => StatusCode::BAD_REQUEST,
            AppError::CodeExpired => {
                body.expired = true;
                StatusCode::BAD_REQUEST
            }
            AppError::AlreadyBlocked | AppError::NotBlocked => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Delivery(ref msg) => {
                tracing::error!(error = %msg, "Email delivery failed");
                body.error =
                    "Failed to send verification email. Please try registering again.".to_string();
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(ref msg) => {
                tracing::error!(error = %msg, "Database error");
                body.error = "Internal server error".to_string();
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(ref err) => {
                tracing::error!(error = %err, "Internal server error");
                body.error = "Internal server error".to_string();
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
