//! Upstream API error taxonomy.
//!
//! Callers get typed failures, never raw transport errors: auth problems
//! and missing resources surface immediately, rate limits and network
//! hiccups are retryable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Token rejected; no point retrying.
    #[error("{service} rejected the API token; check the configured credential")]
    AuthInvalid { service: String },

    /// Upstream asked us to slow down.
    #[error("rate limited by upstream (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Connection/timeout/5xx class failure; worth retrying.
    #[error("transient upstream error: {0}")]
    Transient(String),

    #[error("unexpected upstream error: {0}")]
    Unknown(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. } | ApiError::Transient(_)
        )
    }

    /// Classification tag for audit payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthInvalid { .. } => "auth_invalid",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Transient(_) => "transient",
            ApiError::Unknown(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ApiError::Transient(err.to_string())
        } else {
            ApiError::Unknown(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(ApiError::Transient("reset".into()).is_retryable());
        assert!(ApiError::RateLimited {
            retry_after_secs: Some(30)
        }
        .is_retryable());
        assert!(!ApiError::AuthInvalid {
            service: "taskstore".into()
        }
        .is_retryable());
        assert!(!ApiError::NotFound {
            resource: "task t1".into()
        }
        .is_retryable());
    }
}
