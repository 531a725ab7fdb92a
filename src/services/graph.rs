// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Microsoft Graph client for directory and calendar access.
//!
//! Handles:
//! - App-only (client credentials) token acquisition with expiry caching
//! - Directory listing and lookup of accounts
//! - Free-busy schedule probes and calendar event fetches
//! - Pushing accept/decline/tentative responses back to events

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;
use crate::models::DirectoryAccount;
use crate::time_utils::format_utc_rfc3339;

/// Margin before token expiry when we proactively re-acquire (60 seconds).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Fields requested for every directory user.
const USER_SELECT: &str = "id,mail,displayName,userPrincipalName";

/// Fields requested for every calendar event.
const EVENT_SELECT: &str = "id,subject,bodyPreview,start,end,location,organizer,recurrence";

/// The three response verbs the external calendar accepts for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    Accept,
    Decline,
    Tentative,
}

impl EventResponse {
    /// API action segment for this response.
    pub fn action(&self) -> &'static str {
        match self {
            EventResponse::Accept => "accept",
            EventResponse::Decline => "decline",
            EventResponse::Tentative => "tentativelyAccept",
        }
    }
}

/// Operations the sync pipeline and the attendance pusher need from the
/// external calendar/directory service.
#[async_trait]
pub trait CalendarDirectory: Send + Sync {
    /// List every account in the organization directory.
    async fn list_accounts(&self) -> Result<Vec<DirectoryAccount>, AppError>;

    /// Whether the account's mailbox is provisioned and reachable.
    async fn probe_mailbox(&self, account_id: &str) -> Result<bool, AppError>;

    /// Whether the mailbox has any busy slot inside `[start, end)`.
    async fn has_busy(
        &self,
        mail: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Result<bool, AppError>;

    /// Calendar events for the account within `[start, end)`.
    async fn fetch_events(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, AppError>;

    /// Directed directory lookup by primary email.
    async fn find_account(&self, email: &str) -> Result<Option<DirectoryAccount>, AppError>;

    /// Post an attendance response to the event copy in the account's
    /// calendar.
    async fn respond_to_event(
        &self,
        mail: &str,
        external_event_id: &str,
        response: EventResponse,
        comment: &str,
    ) -> Result<(), AppError>;
}

/// Microsoft Graph API client.
///
/// One long-lived instance is shared (behind `Arc`) by the scheduler and the
/// attendance pusher; the cached app token makes creating it per call both
/// wasteful and rate-limit hostile.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    /// Cached app-only token, re-acquired shortly before expiry.
    token: RwLock<Option<CachedToken>>,
}

/// Cached access token with expiry information.
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl GraphClient {
    /// Create a new Graph client with client-credentials auth for a tenant.
    pub fn new(tenant_id: &str, client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://graph.microsoft.com/v1.0".to_string(),
            token_url: format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                tenant_id
            ),
            client_id,
            client_secret,
            token: RwLock::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.tenant_id,
            config.client_id.clone(),
            config.client_secret.clone(),
        )
    }

    // ─── Token Management ────────────────────────────────────────

    /// Get a valid app-only access token, re-acquiring when expiring.
    ///
    /// Fast path is a read lock on the cache; the write lock re-checks after
    /// acquisition so concurrent callers trigger a single token request.
    async fn get_access_token(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if now + margin < token.expires_at {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            if now + margin < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", "https://graph.microsoft.com/.default"),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AppError::GraphApi(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Graph token request failed");
            return Err(AppError::GraphApi(AppError::GRAPH_AUTH_ERROR.to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::GraphApi(format!("Failed to parse token response: {}", e)))?;

        let expires_at = now + Duration::seconds(token.expires_in);
        *slot = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        tracing::debug!("Acquired Graph app token");
        Ok(token.access_token)
    }

    // ─── Request Helpers ─────────────────────────────────────────

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, AppError> {
        let token = self.get_access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::GraphApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Follow `@odata.nextLink` pages, collecting every `value` entry.
    async fn get_all_pages<T: for<'de> Deserialize<'de>>(
        &self,
        first_url: String,
    ) -> Result<Vec<T>, AppError> {
        let mut out = Vec::new();
        let mut url = first_url;
        loop {
            let page: ListResponse<T> = self.get_json(&url).await?;
            out.extend(page.value);
            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(out)
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Throttled - the next scheduled run retries the whole window
        if status.as_u16() == 429 {
            tracing::warn!("Graph rate limit hit (429)");
            return Err(AppError::GraphApi(AppError::GRAPH_RATE_LIMIT.to_string()));
        }

        // Unauthorized - app credentials rejected or token revoked
        if status.as_u16() == 401 {
            return Err(AppError::GraphApi(AppError::GRAPH_AUTH_ERROR.to_string()));
        }

        Err(AppError::GraphApi(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Graph rate limit hit (429)");
                return Err(AppError::GraphApi(AppError::GRAPH_RATE_LIMIT.to_string()));
            }

            if status.as_u16() == 401 {
                return Err(AppError::GraphApi(AppError::GRAPH_AUTH_ERROR.to_string()));
            }

            return Err(AppError::GraphApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GraphApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl CalendarDirectory for GraphClient {
    async fn list_accounts(&self) -> Result<Vec<DirectoryAccount>, AppError> {
        let url = format!("{}/users?$select={}", self.base_url, USER_SELECT);
        let users: Vec<DirectoryUser> = self.get_all_pages(url).await?;
        let accounts: Vec<DirectoryAccount> =
            users.into_iter().map(DirectoryUser::into_account).collect();
        tracing::debug!(count = accounts.len(), "Listed directory accounts");
        Ok(accounts)
    }

    async fn probe_mailbox(&self, account_id: &str) -> Result<bool, AppError> {
        let token = self.get_access_token().await?;
        let url = format!(
            "{}/users/{}/mailboxSettings",
            self.base_url,
            urlencoding::encode(account_id)
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::GraphApi(e.to_string()))?;

        // Unprovisioned or disabled mailboxes answer 404; tenants without a
        // mailbox license answer 403. Both mean "not live", not an error.
        match response.status().as_u16() {
            404 | 403 => Ok(false),
            _ => {
                self.check_response(response).await?;
                Ok(true)
            }
        }
    }

    async fn has_busy(
        &self,
        mail: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Result<bool, AppError> {
        let token = self.get_access_token().await?;
        let url = format!(
            "{}/users/{}/calendar/getSchedule",
            self.base_url,
            urlencoding::encode(mail)
        );

        let body = serde_json::json!({
            "schedules": [mail],
            "startTime": {
                "dateTime": format_utc_rfc3339(start),
                "timeZone": "UTC"
            },
            "endTime": {
                "dateTime": format_utc_rfc3339(end),
                "timeZone": "UTC"
            },
            "availabilityViewInterval": interval_minutes
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GraphApi(e.to_string()))?;

        let schedule: ScheduleResponse = self.check_response_json(response).await?;
        Ok(schedule_shows_busy(&schedule.value))
    }

    async fn fetch_events(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let filter = format!(
            "start/dateTime ge '{}' and end/dateTime le '{}'",
            format_utc_rfc3339(start),
            format_utc_rfc3339(end)
        );
        let url = format!(
            "{}/users/{}/calendar/events?$filter={}&$select={}",
            self.base_url,
            urlencoding::encode(account_id),
            urlencoding::encode(&filter),
            EVENT_SELECT
        );
        self.get_all_pages(url).await
    }

    async fn find_account(&self, email: &str) -> Result<Option<DirectoryAccount>, AppError> {
        // OData string literals escape single quotes by doubling them.
        let filter = format!("mail eq '{}'", email.replace('\'', "''"));
        let url = format!(
            "{}/users?$filter={}&$select={}",
            self.base_url,
            urlencoding::encode(&filter),
            USER_SELECT
        );
        let page: ListResponse<DirectoryUser> = self.get_json(&url).await?;
        Ok(page.value.into_iter().next().map(DirectoryUser::into_account))
    }

    async fn respond_to_event(
        &self,
        mail: &str,
        external_event_id: &str,
        response: EventResponse,
        comment: &str,
    ) -> Result<(), AppError> {
        let token = self.get_access_token().await?;
        let url = format!(
            "{}/users/{}/events/{}/{}",
            self.base_url,
            urlencoding::encode(mail),
            urlencoding::encode(external_event_id),
            response.action()
        );

        let body = serde_json::json!({
            "sendResponse": true,
            "comment": comment
        });

        let http_response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GraphApi(e.to_string()))?;

        self.check_response(http_response).await?;
        tracing::info!(account = %mail, action = response.action(), "Pushed event response");
        Ok(())
    }
}

/// Busy when any schedule item is non-free, or any availability slot carries
/// a non-zero code.
fn schedule_shows_busy(schedules: &[ScheduleInformation]) -> bool {
    schedules.iter().any(|schedule| {
        let item_busy = schedule
            .schedule_items
            .as_deref()
            .is_some_and(|items| items.iter().any(|i| i.status.as_deref() != Some("free")));
        let view_busy = schedule
            .availability_view
            .as_deref()
            .is_some_and(|view| view.chars().any(|c| c != '0'));
        item_busy || view_busy
    })
}

// ─── Wire Types ──────────────────────────────────────────────────

/// Client-credentials token response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Paged collection response.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Directory user entry.
#[derive(Debug, Clone, Deserialize)]
struct DirectoryUser {
    id: String,
    mail: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "userPrincipalName")]
    user_principal_name: Option<String>,
}

impl DirectoryUser {
    fn into_account(self) -> DirectoryAccount {
        DirectoryAccount {
            id: self.id,
            mail: self.mail,
            display_name: self.display_name.unwrap_or_default(),
            user_principal_name: self.user_principal_name,
        }
    }
}

/// A calendar event as returned by the events endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub subject: Option<String>,
    #[serde(rename = "bodyPreview")]
    pub body_preview: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub location: Option<EventLocation>,
    pub organizer: Option<EventOrganizer>,
    /// Recurrence pattern; only its presence matters here.
    pub recurrence: Option<serde_json::Value>,
}

/// Zone-annotated timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Parse into a UTC instant.
    ///
    /// Graph reports event times in UTC by default, as a timestamp with a
    /// seven-digit fraction and no offset suffix.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let value = self.date_time.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLocation {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventOrganizer {
    #[serde(rename = "emailAddress")]
    pub email_address: Option<EmailAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// One mailbox's free-busy answer from getSchedule.
#[derive(Debug, Clone, Deserialize)]
struct ScheduleResponse {
    value: Vec<ScheduleInformation>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleInformation {
    #[serde(rename = "availabilityView")]
    availability_view: Option<String>,
    #[serde(rename = "scheduleItems")]
    schedule_items: Option<Vec<ScheduleItem>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleItem {
    status: Option<String>,
}
