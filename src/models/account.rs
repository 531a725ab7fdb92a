// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Directory account model (from the external directory, never persisted).

use serde::{Deserialize, Serialize};

/// Marker Azure AD embeds in the principal name of guest accounts.
pub const EXTERNAL_ACCOUNT_MARKER: &str = "#EXT#";

/// An account as listed by the external directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryAccount {
    /// Directory object ID
    pub id: String,
    /// Primary SMTP address (absent on mail-disabled accounts)
    pub mail: Option<String>,
    /// Display name
    pub display_name: String,
    /// User principal name (absent on some service accounts)
    pub user_principal_name: Option<String>,
}

impl DirectoryAccount {
    /// Domain part of the primary email, lowercased.
    pub fn mail_domain(&self) -> Option<String> {
        self.mail.as_deref().and_then(email_domain)
    }

    /// Domain part of the principal name, lowercased.
    pub fn principal_domain(&self) -> Option<String> {
        self.user_principal_name.as_deref().and_then(email_domain)
    }

    /// Guest/external accounts carry a `#EXT#` marker in the principal name.
    pub fn is_external(&self) -> bool {
        self.user_principal_name
            .as_deref()
            .is_some_and(|upn| upn.contains(EXTERNAL_ACCOUNT_MARKER))
    }
}

/// Extract the domain part of an email address, lowercased.
pub fn email_domain(email: &str) -> Option<String> {
    email.rsplit_once('@').map(|(_, d)| d.to_lowercase())
}
