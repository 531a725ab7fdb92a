// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared across the sync engine and services.

/// Application error type.
///
/// The sync pipeline treats `GraphApi` errors as transient (retried only by
/// the next scheduled run, never within a run) and `Store` errors as local
/// consistency failures (caught at the scheduler, retried next run).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Scheduling conflict: {0}")]
    Conflict(String),

    #[error("Graph API error: {0}")]
    GraphApi(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Sentinel message for Graph 429 responses.
    pub const GRAPH_RATE_LIMIT: &'static str = "Graph rate limit exceeded";
    /// Sentinel message for Graph 401/403 responses (expired or rejected token).
    pub const GRAPH_AUTH_ERROR: &'static str = "Graph token rejected";

    /// True for errors the next scheduled sync run may clear on its own
    /// (network, rate limit, upstream 5xx). Data and identity errors are not
    /// transient: re-running with the same input fails the same way.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::GraphApi(_) | AppError::Store(_))
    }
}

/// Result type alias for services
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AppError::GraphApi("timeout".into()).is_transient());
        assert!(AppError::Store("constraint".into()).is_transient());
        assert!(!AppError::NotFound("user".into()).is_transient());
        assert!(!AppError::BadRequest("missing title".into()).is_transient());
    }
}
