//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use warranty_core::error::DomainError;
use warranty_core::value_objects::CodeValue;

/// Convert SQLx error to DomainError
///
/// Pool exhaustion and connection loss are retryable; everything else is not.
pub fn map_db_error(e: SqlxError) -> DomainError {
    match e {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
            DomainError::TransientStoreFailure(e.to_string())
        }
        _ => DomainError::DatabaseError(e.to_string()),
    }
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    map_db_error(e)
}

/// Create a "code not found" error
pub fn code_not_found(code: &CodeValue) -> DomainError {
    DomainError::CodeNotFound(code.to_string())
}
