//! Service-level errors.
//!
//! Every public directory operation returns `Result<T, DirectoryError>`.

use std::time::Duration;

use thiserror::Error;

use storefinder_core::ValidationErrors;

use crate::db::RepositoryError;

/// Errors surfaced by the directory services.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Input failed validation; nothing was written.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Caller does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A write referenced something that doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Requested page lies past the last one.
    #[error("page out of range (last page is {last_page})")]
    PageOutOfRange { last_page: u32 },

    /// The operation did not finish in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Persistence failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,
}

impl From<ValidationErrors> for DirectoryError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl DirectoryError {
    /// Surface a repository miss on a write path as `NotFound`.
    pub(crate) fn on_write(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            other => Self::Repository(other),
        }
    }

    /// Field errors, when this is a validation failure.
    #[must_use]
    pub const fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type alias for `DirectoryError`.
pub type Result<T> = std::result::Result<T, DirectoryError>;
