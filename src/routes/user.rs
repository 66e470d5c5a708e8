// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gated user routes: profile, dashboard, and emergency contacts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::AuthSession;
use crate::models::account::compute_completeness;
use crate::models::contact::CONTACT_KINDS;
use crate::models::{Account, EmergencyContact};
use crate::routes::MessageResponse;
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/dashboard", get(get_dashboard))
        .route("/user/contacts", get(list_contacts).post(create_contact))
        .route(
            "/user/contacts/{contact_id}",
            put(update_contact).delete(delete_contact),
        )
}

// ─── Account Summary ─────────────────────────────────────────

/// Public view of an account. Never carries the password hash, OTP
/// fields, or block bookkeeping.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_admin: bool,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_completeness: u8,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub login_count: u64,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            is_verified: account.is_verified,
            is_admin: account.is_admin,
            full_name: account.full_name.clone(),
            phone: account.phone.clone(),
            address: account.address.clone(),
            profile_completeness: account.profile_completeness,
            login_count: account.login_count,
            last_login: account.last_login.clone(),
            created_at: account.created_at.clone(),
        }
    }
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub user: AccountSummary,
}

async fn get_profile(
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<ProfileResponse>> {
    Ok(Json(ProfileResponse {
        success: true,
        user: AccountSummary::from(&auth.account),
    }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 120, message = "Full name is too long"))]
    #[serde(default)]
    full_name: Option<String>,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    #[serde(default)]
    phone: Option<String>,
    #[validate(length(max = 300, message = "Address is too long"))]
    #[serde(default)]
    address: Option<String>,
}

/// Replace the optional profile fields. Absent or blank fields clear;
/// identity and verification state are not touchable here.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut account = auth.account;
    account.full_name = normalize(payload.full_name);
    account.phone = normalize(payload.phone);
    account.address = normalize(payload.address);
    account.profile_completeness = compute_completeness(
        account.full_name.as_deref(),
        account.phone.as_deref(),
        account.address.as_deref(),
    );
    state.db.update_account_profile(&account).await?;

    Ok(Json(ProfileResponse {
        success: true,
        user: AccountSummary::from(&account),
    }))
}

/// Trim whitespace; blank becomes none.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub user: AccountSummary,
    pub active_sessions: u32,
    pub emergency_contacts: u32,
}

/// Aggregate view for the landing screen.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<DashboardResponse>> {
    let sessions = state.sessions.list_active(&auth.account.id).await?;
    let contacts = state.db.list_contacts(&auth.account.id).await?;

    Ok(Json(DashboardResponse {
        success: true,
        user: AccountSummary::from(&auth.account),
        active_sessions: sessions.len() as u32,
        emergency_contacts: contacts.len() as u32,
    }))
}

// ─── Emergency Contacts ──────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<EmergencyContact> for ContactSummary {
    fn from(contact: EmergencyContact) -> Self {
        Self {
            id: contact.id,
            kind: contact.kind,
            name: contact.name,
            phone: contact.phone,
            address: contact.address,
            notes: contact.notes,
            created_at: contact.created_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub contact: ContactSummary,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ContactsResponse {
    pub success: bool,
    pub contacts: Vec<ContactSummary>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    kind: String,
    #[validate(length(min = 1, max = 120, message = "Contact name is required"))]
    name: String,
    #[validate(length(min = 1, max = 32, message = "Contact phone is required"))]
    phone: String,
    #[validate(length(max = 300, message = "Address is too long"))]
    #[serde(default)]
    address: Option<String>,
    #[validate(length(max = 500, message = "Notes are too long"))]
    #[serde(default)]
    notes: Option<String>,
}

impl ContactPayload {
    fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if !CONTACT_KINDS.contains(&self.kind.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Contact kind must be one of: {}",
                CONTACT_KINDS.join(", ")
            )));
        }
        Ok(())
    }
}

async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<ContactsResponse>> {
    let contacts = state.db.list_contacts(&auth.account.id).await?;

    Ok(Json(ContactsResponse {
        success: true,
        contacts: contacts.into_iter().map(ContactSummary::from).collect(),
    }))
}

async fn create_contact(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Json(payload): Json<ContactPayload>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    payload.check()?;

    let contact = EmergencyContact {
        id: Uuid::new_v4().to_string(),
        account_id: auth.account.id,
        kind: payload.kind,
        name: payload.name,
        phone: payload.phone,
        address: normalize(payload.address),
        notes: normalize(payload.notes),
        created_at: now_rfc3339(),
    };
    state.db.upsert_contact(&contact).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            contact: ContactSummary::from(contact),
        }),
    ))
}

async fn update_contact(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Path(contact_id): Path<String>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<ContactResponse>> {
    payload.check()?;

    let mut contact = owned_contact(&state, &contact_id, &auth.account.id).await?;
    contact.kind = payload.kind;
    contact.name = payload.name;
    contact.phone = payload.phone;
    contact.address = normalize(payload.address);
    contact.notes = normalize(payload.notes);
    state.db.upsert_contact(&contact).await?;

    Ok(Json(ContactResponse {
        success: true,
        contact: ContactSummary::from(contact),
    }))
}

async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Path(contact_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let contact = owned_contact(&state, &contact_id, &auth.account.id).await?;
    state.db.delete_contact(&contact.id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Contact deleted".to_string(),
    }))
}

/// Fetch a contact only if the caller owns it. Someone else's contact is
/// indistinguishable from a missing one.
async fn owned_contact(
    state: &AppState,
    contact_id: &str,
    account_id: &str,
) -> Result<EmergencyContact> {
    state
        .db
        .get_contact(contact_id)
        .await?
        .filter(|c| c.account_id == account_id)
        .ok_or_else(|| AppError::NotFound("Contact".to_string()))
}
