// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emergency contact records (doctor, hospital, phone).

use serde::{Deserialize, Serialize};

/// Contact kinds accepted by the API.
pub const CONTACT_KINDS: [&str; 3] = ["doctor", "hospital", "phone"];

/// Emergency contact owned by an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Document ID (UUID)
    pub id: String,
    /// Owning account ID
    pub account_id: String,
    /// Record kind: "doctor", "hospital", or "phone"
    pub kind: String,
    /// Contact or facility name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// Street address
    pub address: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the record was created (ISO 8601)
    pub created_at: String,
}
