// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session model for storage and API.

use serde::{Deserialize, Serialize};

use super::device::DeviceInfo;

/// One authenticated login on one device, stored in Firestore.
///
/// The token pair lives on the session row itself; a refresh overwrites
/// both tokens in place rather than creating a new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Document ID (UUID)
    pub id: String,
    /// Owning account ID
    pub account_id: String,
    /// Current access token, rotated in place on refresh
    pub session_token: String,
    /// Current refresh token, single-use per rotation
    pub refresh_token: String,
    /// Device snapshot captured at creation
    pub device_info: DeviceInfo,
    /// Usable only while true; cleared on logout, block, or expiry
    pub is_active: bool,
    /// Last time the gate accepted a request on this session (ISO 8601)
    pub last_activity: String,
    /// Hard expiry; activity never extends it (ISO 8601)
    pub expires_at: String,
    /// When the session was created (ISO 8601)
    pub created_at: String,
}
