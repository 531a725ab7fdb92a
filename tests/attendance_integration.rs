// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance flow tests: the local write always commits, the external push
//! is best-effort and bounded.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{candidate, ts, MockDirectory};
use meeting_tracker::config::Config;
use meeting_tracker::error::AppError;
use meeting_tracker::models::{AttendanceStatus, MeetingCategory, NewMeeting, NewUser};
use meeting_tracker::services::AttendanceService;
use meeting_tracker::store::{MeetingStore, MemoryStore};

/// Store seeded with one user and one synced meeting; directory knows the
/// user's account. Returns the synced meeting's id.
async fn setup(directory: &MockDirectory, store: &MemoryStore) -> i64 {
    directory.add_account("acc-frank", "frank@example.com", "Frank");
    store
        .insert_user(NewUser {
            email: "frank@example.com".to_string(),
            full_name: "Frank".to_string(),
        })
        .await
        .unwrap();
    let outcome = store
        .upsert_by_external_id(
            &candidate(
                "evt-1",
                "Standup",
                ts(2026, 3, 10, 9, 0),
                ts(2026, 3, 10, 9, 15),
            ),
            None,
        )
        .await
        .unwrap();
    outcome.meeting().id
}

fn service(directory: Arc<MockDirectory>, store: Arc<MemoryStore>) -> AttendanceService {
    AttendanceService::new(store, directory, &Config::default())
}

#[tokio::test]
async fn present_pushes_accept_with_comment() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;
    let attendance = service(directory.clone(), store.clone());

    let result = attendance
        .update_attendance(meeting_id, "frank@example.com", AttendanceStatus::Present)
        .await
        .unwrap();
    assert!(result.local_committed);
    assert!(result.external_pushed);
    assert!(result.error.is_none());

    let record = store.get_attendance(meeting_id, 1).await.unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);

    let pushes = directory.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].mail, "frank@example.com");
    assert_eq!(pushes[0].event_id, "evt-1");
    assert_eq!(pushes[0].action, "accept");
    assert_eq!(pushes[0].comment, "Marked as present");
}

#[tokio::test]
async fn absent_and_late_map_to_decline_and_tentative() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;
    let attendance = service(directory.clone(), store.clone());

    attendance
        .update_attendance(meeting_id, "frank@example.com", AttendanceStatus::Absent)
        .await
        .unwrap();
    attendance
        .update_attendance(meeting_id, "frank@example.com", AttendanceStatus::Late)
        .await
        .unwrap();

    let pushes = directory.pushes();
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[0].action, "decline");
    assert_eq!(pushes[0].comment, "Marked as absent");
    assert_eq!(pushes[1].action, "tentativelyAccept");
    assert_eq!(pushes[1].comment, "Attendance status: late");

    // Same (meeting, user) pair: the second action replaced the first
    let record = store.get_attendance(meeting_id, 1).await.unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::Late);
}

#[tokio::test]
async fn rejected_push_keeps_local_status() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;
    directory.set_push_failure();
    let attendance = service(directory.clone(), store.clone());

    let result = attendance
        .update_attendance(meeting_id, "frank@example.com", AttendanceStatus::Present)
        .await
        .unwrap();
    assert!(result.local_committed);
    assert!(!result.external_pushed);
    assert!(result.error.is_some());

    let record = store.get_attendance(meeting_id, 1).await.unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);
}

#[tokio::test]
async fn slow_push_times_out_within_bound() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;
    directory.set_push_delay(Duration::from_millis(1500));

    let config = Config {
        push_timeout_secs: 1,
        ..Config::default()
    };
    let attendance = AttendanceService::new(store.clone(), directory.clone(), &config);

    let started = Instant::now();
    let result = attendance
        .update_attendance(meeting_id, "frank@example.com", AttendanceStatus::Present)
        .await
        .unwrap();
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "a hung push must not block the caller"
    );

    assert!(result.local_committed);
    assert!(!result.external_pushed);
    assert!(result.error.as_deref().unwrap().contains("timed out"));

    // Local status committed, nothing recorded externally
    let record = store.get_attendance(meeting_id, 1).await.unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);
    assert!(directory.pushes().is_empty());
}

#[tokio::test]
async fn missing_directory_account_is_a_soft_failure() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;

    // The user exists locally but the directory has no account for a second
    // on-domain user
    let user = store
        .insert_user(NewUser {
            email: "grace@example.com".to_string(),
            full_name: "Grace".to_string(),
        })
        .await
        .unwrap();
    let attendance = service(directory.clone(), store.clone());

    let result = attendance
        .update_attendance(meeting_id, "grace@example.com", AttendanceStatus::Present)
        .await
        .unwrap();
    assert!(result.local_committed);
    assert!(!result.external_pushed);
    assert!(result.error.is_some());

    let record = store
        .get_attendance(meeting_id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);
}

#[tokio::test]
async fn dead_mailbox_is_a_soft_failure() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;
    directory.set_probe_dead("acc-frank");
    let attendance = service(directory.clone(), store.clone());

    let result = attendance
        .update_attendance(meeting_id, "frank@example.com", AttendanceStatus::Absent)
        .await
        .unwrap();
    assert!(result.local_committed);
    assert!(!result.external_pushed);
    assert!(result.error.as_deref().unwrap().contains("not active"));
    assert!(directory.pushes().is_empty());
}

#[tokio::test]
async fn local_meeting_commits_without_push() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    setup(&directory, &store).await;

    let local = store
        .insert_meeting(NewMeeting {
            title: "Local only".to_string(),
            description: None,
            start_time: ts(2026, 3, 10, 12, 0),
            end_time: ts(2026, 3, 10, 13, 0),
            location: "Room B".to_string(),
            organizer_id: 1,
            organizer_name: Some("Frank".to_string()),
            organizer_email: Some("frank@example.com".to_string()),
            category: MeetingCategory::TeamMeeting,
            company_domain: "example.com".to_string(),
        })
        .await
        .unwrap();
    let attendance = service(directory.clone(), store.clone());

    let result = attendance
        .update_attendance(local.id, "frank@example.com", AttendanceStatus::Present)
        .await
        .unwrap();
    assert!(result.local_committed);
    assert!(!result.external_pushed);
    assert!(result.error.is_none(), "nothing to push is not a failure");
    assert!(directory.pushes().is_empty());
}

#[tokio::test]
async fn unknown_user_and_foreign_domain_are_rejected() {
    let directory = Arc::new(MockDirectory::new());
    let store = Arc::new(MemoryStore::new());
    let meeting_id = setup(&directory, &store).await;
    store
        .insert_user(NewUser {
            email: "mallory@partner.com".to_string(),
            full_name: "Mallory".to_string(),
        })
        .await
        .unwrap();
    let attendance = service(directory.clone(), store.clone());

    let missing = attendance
        .update_attendance(meeting_id, "ghost@example.com", AttendanceStatus::Present)
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    let foreign = attendance
        .update_attendance(meeting_id, "mallory@partner.com", AttendanceStatus::Present)
        .await
        .unwrap_err();
    assert!(matches!(foreign, AppError::BadRequest(_)));
}
