//! Error types for the GraceWise library.
//!
//! The grace calculator itself is total and never fails; these errors come
//! from the layers around it (storage, serialization, form validation).

use crate::validation::ValidationError;

/// All errors that can occur when using the GraceWise library.
#[derive(Debug, thiserror::Error)]
pub enum GraceWiseError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// A card form did not pass validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No user identifier was configured for a per-user operation.
    #[error("no user configured; every ledger is scoped to an explicit user id")]
    MissingUser,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, GraceWiseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{CardField, FieldIssue};

    #[test]
    fn error_from_serde_json() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = GraceWiseError::from(serde_err);
        assert!(matches!(err, GraceWiseError::Serialization(_)));
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn error_storage_display() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = GraceWiseError::Storage(Box::new(inner));
        let msg = err.to_string();
        assert!(msg.contains("storage error"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn error_validation_is_transparent() {
        let issues = vec![FieldIssue::new(CardField::Name, "Card name is required (3+ chars)")];
        let err = GraceWiseError::from(ValidationError::new(issues));
        assert!(err.to_string().contains("Card name is required"));
    }

    #[test]
    fn error_missing_user_display() {
        assert!(GraceWiseError::MissingUser.to_string().contains("no user"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GraceWiseError>();
    }
}
