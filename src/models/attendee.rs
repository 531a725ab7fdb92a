// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance records: employees (unique per meeting/user pair) and guests
//! (append-only check-ins, no local account).

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attendance status for a (meeting, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// No decision recorded yet
    Pending,
    Present,
    Absent,
    /// Tentative-equivalent
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Pending => "pending",
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance record for a local user. Unique per (meeting, user); a second
/// action updates the status, never creates a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingAttendee {
    pub meeting_id: i64,
    pub user_id: i64,
    pub status: AttendanceStatus,
}

/// Guest check-in payload (no local account).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GuestInfo {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub company: Option<String>,
}

/// Stored guest check-in. Append-only; guests are never deduplicated against
/// `MeetingAttendee` records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestAttendee {
    pub meeting_id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Late).unwrap(),
            "\"late\""
        );
        let back: AttendanceStatus = serde_json::from_str("\"present\"").unwrap();
        assert_eq!(back, AttendanceStatus::Present);
    }

    #[test]
    fn test_guest_info_validation() {
        let ok = GuestInfo {
            name: "Visiting Vendor".to_string(),
            email: "vendor@partner.com".to_string(),
            company: Some("Partner Co".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad_email = GuestInfo {
            name: "Visiting Vendor".to_string(),
            email: "not-an-email".to_string(),
            company: None,
        };
        assert!(bad_email.validate().is_err());

        let empty_name = GuestInfo {
            name: String::new(),
            email: "vendor@partner.com".to_string(),
            company: None,
        };
        assert!(empty_name.validate().is_err());
    }
}
