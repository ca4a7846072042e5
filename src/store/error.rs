//! Datastore error types
//!
//! Defines all errors that can occur while talking to a datastore backend.

use thiserror::Error;

/// Errors that can occur in the datastore layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Requested row does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Embedded SQLite backend failed
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Hosted backend could not be reached or rejected the request
    #[error("Remote datastore error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Transport failure talking to the hosted backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stored data could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for datastore operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Duplicate("waitlist email".to_string());
        assert_eq!(err.to_string(), "Duplicate record: waitlist email");

        let err = StoreError::Remote {
            status: 503,
            message: "upstream down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote datastore error (503): upstream down"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
