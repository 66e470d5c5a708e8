//! Account model for storage and API.

use serde::{Deserialize, Serialize};

/// Registered account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Document ID (UUID)
    pub id: String,
    /// Unique login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Argon2 hash of the password
    pub password_hash: String,
    /// Whether the email was confirmed via OTP
    pub is_verified: bool,
    /// Pending one-time code; cleared together with `otp_expires`
    pub otp: Option<String>,
    /// When the pending code stops being accepted (ISO 8601)
    pub otp_expires: Option<String>,
    /// Administrative suspension flag
    pub is_blocked: bool,
    /// Reason supplied by the blocking admin
    pub block_reason: Option<String>,
    /// When the block was applied (ISO 8601)
    pub blocked_at: Option<String>,
    /// Account ID of the blocking admin
    pub blocked_by: Option<String>,
    /// Grants access to the /admin routes; set out of band
    pub is_admin: bool,
    /// Successful logins so far
    pub login_count: u64,
    /// Advisory profile completeness, 0-100
    pub profile_completeness: u8,
    /// Display name
    pub full_name: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// When the account was created (ISO 8601)
    pub created_at: String,
    /// Last successful login (ISO 8601)
    pub last_login: Option<String>,
}

/// Advisory share of filled profile fields, 0-100. Username and email are
/// always present, so a bare registration starts at 40.
pub fn compute_completeness(
    full_name: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
) -> u8 {
    let filled = 2 + [full_name, phone, address]
        .iter()
        .filter(|f| f.is_some_and(|v| !v.trim().is_empty()))
        .count();
    (filled * 100 / 5) as u8
}
