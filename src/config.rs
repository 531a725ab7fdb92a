//! Application configuration loaded from environment variables.
//!
//! Azure credentials are read once at startup; the Graph client built from
//! them is long-lived and shared across scheduler runs and attendance pushes.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Organization ---
    /// Company email domain; only accounts on this domain are synced
    pub company_domain: String,

    // --- Azure AD app registration (client credentials) ---
    /// Azure AD tenant ID
    pub tenant_id: String,
    /// Azure AD application (client) ID
    pub client_id: String,
    /// Azure AD client secret
    pub client_secret: String,

    // --- Sync tuning ---
    /// Seconds between scheduled sync runs
    pub sync_interval_secs: u64,
    /// Maximum in-flight per-account event fetches during a sync run
    pub fetch_concurrency: usize,
    /// Seconds to wait for an external attendance push before treating it as failed
    pub push_timeout_secs: u64,
    /// Free-busy resolution hint passed to the schedule probe, in minutes
    pub freebusy_interval_minutes: u32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            company_domain: "example.com".to_string(),
            tenant_id: "test-tenant".to_string(),
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            sync_interval_secs: 300,
            fetch_concurrency: 8,
            push_timeout_secs: 10,
            freebusy_interval_minutes: 60,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `COMPANY_DOMAIN` and the three Azure credentials are required; the
    /// sync tuning knobs fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            company_domain: env::var("COMPANY_DOMAIN")
                .map(|v| v.trim().to_lowercase())
                .map_err(|_| ConfigError::Missing("COMPANY_DOMAIN"))?,
            tenant_id: env::var("AZURE_TENANT_ID")
                .map_err(|_| ConfigError::Missing("AZURE_TENANT_ID"))?,
            client_id: env::var("AZURE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("AZURE_CLIENT_ID"))?,
            client_secret: env::var("AZURE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AZURE_CLIENT_SECRET"))?,
            sync_interval_secs: env::var("SYNC_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            fetch_concurrency: env::var("FETCH_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            push_timeout_secs: env::var("PUSH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            freebusy_interval_minutes: env::var("FREEBUSY_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
