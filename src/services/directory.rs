// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Directory filtering: which accounts belong in the sync population.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::DirectoryAccount;
use crate::services::graph::CalendarDirectory;

/// Selects the accounts whose calendars get synced.
///
/// An account qualifies when its primary email domain and its principal-name
/// domain both equal the company domain, its principal name carries no
/// external-guest marker, and its mailbox answers the liveness probe. The
/// first three conditions are static identity checks; the probe is an API
/// call made per account inside the fetch pipeline.
pub struct DirectoryFilter {
    directory: Arc<dyn CalendarDirectory>,
    company_domain: String,
}

impl DirectoryFilter {
    pub fn new(directory: Arc<dyn CalendarDirectory>, company_domain: &str) -> Self {
        Self {
            directory,
            company_domain: company_domain.to_lowercase(),
        }
    }

    /// List the directory and keep accounts passing the identity conditions.
    pub async fn company_accounts(&self) -> Result<Vec<DirectoryAccount>, AppError> {
        let accounts = self.directory.list_accounts().await?;
        let total = accounts.len();

        let company: Vec<DirectoryAccount> = accounts
            .into_iter()
            .filter(|account| self.matches_identity(account))
            .collect();

        tracing::info!(
            total,
            matched = company.len(),
            domain = %self.company_domain,
            "Filtered directory accounts"
        );
        Ok(company)
    }

    /// Identity conditions: both domains match and the account is a member,
    /// not a guest. Accounts missing either identity field are excluded.
    pub fn matches_identity(&self, account: &DirectoryAccount) -> bool {
        let Some(mail_domain) = account.mail_domain() else {
            return false;
        };
        let Some(principal_domain) = account.principal_domain() else {
            return false;
        };
        mail_domain == self.company_domain
            && principal_domain == self.company_domain
            && !account.is_external()
    }

    /// Mailbox liveness. A probe error excludes the account just like a
    /// negative answer; it is logged and never fails the run.
    pub async fn is_live(&self, account: &DirectoryAccount) -> bool {
        let label = account.mail.as_deref().unwrap_or(&account.id);
        match self.directory.probe_mailbox(&account.id).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!(account = %label, "Skipping inactive mailbox");
                false
            }
            Err(e) => {
                tracing::warn!(account = %label, error = %e, "Mailbox probe failed, excluding account");
                false
            }
        }
    }
}
