//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const ACCOUNTS: &str = "accounts";
    pub const SESSIONS: &str = "sessions";
    /// Access-gated contact records (doctor/hospital/phone)
    pub const EMERGENCY_CONTACTS: &str = "emergency_contacts";
}
