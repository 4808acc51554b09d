//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::CodeValueError;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Code not found: {0}")]
    CodeNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid code: {0}")]
    InvalidCode(#[from] CodeValueError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Code {0} is already linked to another user")]
    CodeAlreadyLinked(String),

    #[error("Warranty for code {0} is already activated")]
    CodeAlreadyActivated(String),

    #[error("Code already exists: {0}")]
    CodeAlreadyExists(String),

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Warranty for code {0} is not activated")]
    WarrantyNotActivated(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Store temporarily unavailable: {0}")]
    TransientStoreFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::CodeNotFound(_) => "CODE_NOT_FOUND",

            Self::InvalidCode(_) => "INVALID_CODE",
            Self::ValidationError(_) => "VALIDATION_ERROR",

            Self::CodeAlreadyLinked(_) => "CODE_ALREADY_LINKED",
            Self::CodeAlreadyActivated(_) => "CODE_ALREADY_ACTIVATED",
            Self::CodeAlreadyExists(_) => "CODE_ALREADY_EXISTS",

            Self::WarrantyNotActivated(_) => "WARRANTY_NOT_ACTIVATED",

            Self::TransientStoreFailure(_) => "TRANSIENT_STORE_FAILURE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CodeNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidCode(_) | Self::ValidationError(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::CodeAlreadyLinked(_)
                | Self::CodeAlreadyActivated(_)
                | Self::CodeAlreadyExists(_)
                | Self::WarrantyNotActivated(_)
        )
    }

    /// Check if the caller may retry the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStoreFailure(_))
    }
}
