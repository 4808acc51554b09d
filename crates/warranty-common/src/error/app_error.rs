//! Application error types
//!
//! Errors raised outside the domain rules: startup, configuration, the
//! scheduler and the Discord platform. Domain errors pass through unchanged.

use warranty_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Pool creation or migrations at startup
    #[error("Database error: {0}")]
    Database(String),

    /// Discord answered with an error or could not be reached
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Binding or serving the HTTP listener
    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => domain_status(e),
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Database(_)
            | Self::ExternalService(_)
            | Self::Scheduler(_)
            | Self::Config(_)
            | Self::Server(_) => 500,
        }
    }

    /// Machine-readable code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Scheduler(_) => "SCHEDULER_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Server(_) => "SERVER_ERROR",
        }
    }

    /// Whether the same request may succeed when retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_transient())
    }
}

/// HTTP status for a domain error
///
/// Store failures are 503 so callers know to retry; everything not
/// classified is a 500.
#[must_use]
pub fn domain_status(err: &DomainError) -> u16 {
    if err.is_not_found() {
        404
    } else if err.is_validation() {
        400
    } else if err.is_conflict() {
        409
    } else if err.is_transient() {
        503
    } else {
        500
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
