// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meeting models: the locally stored record, the candidate shape produced by
//! the event fetcher, and the closed set of meeting categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A meeting mirrored from the external calendar or created locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// Internal ID (store-assigned)
    pub id: i64,
    /// Stable ID assigned by the external calendar; `None` for meetings
    /// created locally that have no external counterpart yet
    pub external_event_id: Option<String>,
    /// Title/subject
    pub title: String,
    /// Body preview, if any
    pub description: Option<String>,
    /// Start instant (UTC)
    pub start_time: DateTime<Utc>,
    /// End instant (UTC); always after `start_time`
    pub end_time: DateTime<Utc>,
    /// Free-text room/resource name
    pub location: Option<String>,
    /// Organizer as a local user, when known
    pub organizer_id: Option<i64>,
    /// Organizer display name as reported by the external calendar
    pub organizer_name: Option<String>,
    /// Organizer email as reported by the external calendar
    pub organizer_email: Option<String>,
    /// Meeting classification
    pub category: MeetingCategory,
    /// Whether the external event is part of a recurring series
    pub is_recurring: bool,
    /// Owning organization domain
    pub company_domain: String,
}

/// Normalized event shape produced by the fetcher and consumed by the
/// reconciler. Carries only externally-sourced fields; the reconciler never
/// writes locally-owned relations from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingCandidate {
    pub external_event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub organizer_name: Option<String>,
    pub organizer_email: Option<String>,
    pub is_recurring: bool,
    pub company_domain: String,
}

impl MeetingCandidate {
    /// Reject candidates that are missing a required field or violate the
    /// `end > start` invariant. Returns the reason for the sync error count.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.external_event_id.trim().is_empty() {
            return Err("empty external event id");
        }
        if self.title.trim().is_empty() {
            return Err("empty title");
        }
        if self.end_time <= self.start_time {
            return Err("end time not after start time");
        }
        Ok(())
    }
}

/// Fields for a locally created meeting (no external counterpart yet).
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub organizer_id: i64,
    pub organizer_name: Option<String>,
    pub organizer_email: Option<String>,
    pub category: MeetingCategory,
    pub company_domain: String,
}

/// Closed set of meeting classifications.
///
/// Declared statically and surfaced through [`MeetingCategory::ALL`] instead
/// of being reflected out of a persistence schema at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingCategory {
    TeamMeeting,
    OneOnOne,
    ProjectReview,
    ClientCall,
    Training,
    AllHands,
}

impl MeetingCategory {
    /// Every category, in display order.
    pub const ALL: [MeetingCategory; 6] = [
        MeetingCategory::TeamMeeting,
        MeetingCategory::OneOnOne,
        MeetingCategory::ProjectReview,
        MeetingCategory::ClientCall,
        MeetingCategory::Training,
        MeetingCategory::AllHands,
    ];

    /// Stable snake_case identifier (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingCategory::TeamMeeting => "team_meeting",
            MeetingCategory::OneOnOne => "one_on_one",
            MeetingCategory::ProjectReview => "project_review",
            MeetingCategory::ClientCall => "client_call",
            MeetingCategory::Training => "training",
            MeetingCategory::AllHands => "all_hands",
        }
    }

    /// Human-readable label ("team_meeting" -> "Team Meeting").
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for MeetingCategory {
    fn default() -> Self {
        MeetingCategory::TeamMeeting
    }
}

impl std::fmt::Display for MeetingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> MeetingCandidate {
        MeetingCandidate {
            external_event_id: "AAMk-1".to_string(),
            title: "Weekly sync".to_string(),
            description: None,
            start_time: "2026-03-14T10:00:00Z".parse().unwrap(),
            end_time: "2026-03-14T11:00:00Z".parse().unwrap(),
            location: Some("Room A".to_string()),
            organizer_name: Some("Ana".to_string()),
            organizer_email: Some("ana@example.com".to_string()),
            is_recurring: false,
            company_domain: "example.com".to_string(),
        }
    }

    #[test]
    fn test_valid_candidate_passes() {
        assert!(candidate().validate().is_ok());
    }

    #[test]
    fn test_rejects_missing_required_fields() {
        let mut c = candidate();
        c.external_event_id = "  ".to_string();
        assert_eq!(c.validate(), Err("empty external event id"));

        let mut c = candidate();
        c.title = String::new();
        assert_eq!(c.validate(), Err("empty title"));
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let mut c = candidate();
        c.end_time = c.start_time;
        assert_eq!(c.validate(), Err("end time not after start time"));
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&MeetingCategory::OneOnOne).unwrap();
        assert_eq!(json, "\"one_on_one\"");
        let back: MeetingCategory = serde_json::from_str("\"all_hands\"").unwrap();
        assert_eq!(back, MeetingCategory::AllHands);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(MeetingCategory::TeamMeeting.label(), "Team Meeting");
        assert_eq!(MeetingCategory::OneOnOne.label(), "One On One");
        assert_eq!(MeetingCategory::ALL.len(), 6);
    }
}
