// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes for the block protocol.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::AuthSession;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/block-user", post(block_user))
        .route("/admin/unblock-user", post(unblock_user))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    #[validate(length(min = 1, message = "userId is required"))]
    user_id: String,
    #[validate(length(min = 1, max = 500, message = "A block reason is required"))]
    reason: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnblockRequest {
    #[validate(length(min = 1, message = "userId is required"))]
    user_id: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct BlockStateResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub is_blocked: bool,
}

/// Block an account. All of its sessions are invalidated in the same
/// call, so the block is visible before the account's next request.
async fn block_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Json(payload): Json<BlockRequest>,
) -> Result<Json<BlockStateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if payload.user_id == auth.account.id {
        return Err(AppError::BadRequest(
            "Admins cannot block their own account".to_string(),
        ));
    }

    let account = state
        .accounts
        .set_blocked(&payload.user_id, &payload.reason, &auth.account.id)
        .await?;

    Ok(Json(BlockStateResponse {
        success: true,
        message: format!("{} has been blocked", account.username),
        user_id: account.id,
        is_blocked: true,
    }))
}

/// Clear an account's block state. Old sessions stay dead; the account
/// logs in again from scratch.
async fn unblock_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Json(payload): Json<UnblockRequest>,
) -> Result<Json<BlockStateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let account = state.accounts.set_unblocked(&payload.user_id).await?;

    tracing::info!(
        account_id = %account.id,
        admin_id = %auth.account.id,
        "Account unblocked by admin"
    );
    Ok(Json(BlockStateResponse {
        success: true,
        message: format!("{} has been unblocked", account.username),
        user_id: account.id,
        is_blocked: false,
    }))
}
