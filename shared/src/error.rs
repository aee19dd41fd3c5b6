//! Error types for the calendar service.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving calendar requests.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The calendar row could not be created or its events could not be cleared
    #[error("Calendar write error: {0}")]
    CalendarWrite(String),

    /// Entity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data violates an invariant
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Get HTTP status code for this error.
    ///
    /// Decode failures map to 500 like every other failure that is not a
    /// business rule.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::CalendarWrite(_) => 400,
            Error::Conflict(_) => 409,
            _ => 500,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("day is before current day".into()).status_code(), 400);
        assert_eq!(Error::CalendarWrite("failed".into()).status_code(), 400);
        assert_eq!(Error::Conflict("user already exists".into()).status_code(), 409);
        assert_eq!(Error::Corrupt("no uuid".into()).status_code(), 500);
        assert_eq!(Error::Database(sqlx::Error::RowNotFound).status_code(), 500);

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(decode).status_code(), 500);
    }
}
