//! Store error taxonomy: transient errors are retried, structural ones fail
//! fast.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Lock contention or I/O hiccup; safe to retry with backoff.
    #[error("transient storage error: {0}")]
    Transient(String),

    /// Schema/query/constraint problem; retrying cannot help.
    #[error("storage error: {0}")]
    Fatal(String),

    /// A persisted value failed to parse back.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    /// Classification tag for audit payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Transient(_) => "transient",
            StoreError::Fatal(_) => "fatal",
            StoreError::Corrupt(_) => "corrupt",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => match ffi_err.code {
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::CannotOpen => StoreError::Transient(err.to_string()),
                _ => StoreError::Fatal(err.to_string()),
            },
            _ => StoreError::Fatal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_transient() {
        let ffi = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY);
        let err: StoreError = rusqlite::Error::SqliteFailure(ffi, None).into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_query_error_is_fatal() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(!err.is_transient());
        assert_eq!(err.kind(), "fatal");
    }
}
