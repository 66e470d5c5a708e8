// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes: registration, verification, login, token
//! refresh, and logout.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::AuthSession;
use crate::models::DeviceInfo;
use crate::routes::user::AccountSummary;
use crate::routes::MessageResponse;
use crate::services::NewAccount;
use crate::AppState;

/// Routes reachable without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/resend-otp", post(resend_otp))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/refresh-session", post(refresh_session))
}

/// Routes that operate on the caller's own session. The session gate is
/// applied in routes/mod.rs.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/sessions/{session_id}", delete(revoke_session))
}

// ─── Registration & Verification ─────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    username: String,
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let account = state
        .accounts
        .register(NewAccount {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            phone: payload.phone,
            address: payload.address,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: format!("Verification code sent to {}", account.email),
        }),
    ))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    otp: String,
}

async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.accounts.verify_otp(&payload.email, &payload.otp).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Email verified successfully".to_string(),
    }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
}

async fn resend_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<Json<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let account = state.accounts.resend_otp(&payload.email).await?;

    let message = if account.is_verified {
        "Email already verified".to_string()
    } else {
        format!("Verification code sent to {}", account.email)
    };
    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

// ─── Login & Token Refresh ───────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email.
    #[validate(length(min = 1, message = "Username or email is required"))]
    identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub expires_in: i64,
    pub session_id: String,
    pub user: AccountSummary,
}

async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let account = state
        .accounts
        .authenticate(&payload.identifier, &payload.password)
        .await?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    let device = DeviceInfo::from_user_agent(user_agent, &client_ip(&headers));

    let (session, pair) = state.sessions.create(&account.id, device).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.access_ttl_secs,
        session_id: session.id,
        user: AccountSummary::from(&account),
    }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    refresh_token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub expires_in: i64,
    pub session_id: String,
}

/// Rotate a refresh token into a new token pair on the same session.
async fn refresh_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (session, pair) = state.sessions.refresh(&payload.refresh_token).await?;

    Ok(Json(RefreshResponse {
        success: true,
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.access_ttl_secs,
        session_id: session.id,
    }))
}

// ─── Password Reset ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.accounts.request_password_reset(&payload.email).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!("Password reset code sent to {}", payload.email),
    }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    otp: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    new_password: String,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .accounts
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Password updated. Please login again.".to_string(),
    }))
}

// ─── Session Management ──────────────────────────────────────

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<MessageResponse>> {
    state.sessions.invalidate(&auth.session).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out".to_string(),
    }))
}

async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<MessageResponse>> {
    let count = state.sessions.invalidate_all(&auth.account.id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!("Logged out of {} sessions", count),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    pub ip: String,
    pub last_activity: String,
    pub created_at: String,
    pub expires_at: String,
    pub is_current: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummary>,
}

/// List the caller's active sessions, most recently used first, with the
/// one serving this request flagged.
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<SessionsResponse>> {
    let sessions = state.sessions.list_active(&auth.account.id).await?;

    let sessions = sessions
        .into_iter()
        .map(|s| SessionSummary {
            is_current: s.id == auth.session.id,
            id: s.id,
            browser: s.device_info.browser,
            os: s.device_info.os,
            device: s.device_info.device,
            ip: s.device_info.ip,
            last_activity: s.last_activity,
            created_at: s.created_at,
            expires_at: s.expires_at,
        })
        .collect();

    Ok(Json(SessionsResponse {
        success: true,
        sessions,
    }))
}

/// Log out one of the caller's other sessions by id.
async fn revoke_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .sessions
        .invalidate_by_owner(&session_id, &auth.account.id)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Session revoked".to_string(),
    }))
}

/// Client address, honoring the proxy headers set by the load balancer.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
