//! Local user model.
//!
//! Users are provisioned by the (out-of-scope) login flow; the sync core only
//! reads them to attribute organizers and attendees.

use serde::{Deserialize, Serialize};

/// A local user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal ID (store-assigned)
    pub id: i64,
    /// Email, lowercased
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Deactivated users keep their history but stop appearing in new flows
    pub is_active: bool,
}

/// Fields for provisioning a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
}
