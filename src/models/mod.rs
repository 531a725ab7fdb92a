// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod attendee;
pub mod meeting;
pub mod user;

pub use account::{email_domain, DirectoryAccount, EXTERNAL_ACCOUNT_MARKER};
pub use attendee::{AttendanceStatus, GuestAttendee, GuestInfo, MeetingAttendee};
pub use meeting::{Meeting, MeetingCandidate, MeetingCategory, NewMeeting};
pub use user::{NewUser, User};
