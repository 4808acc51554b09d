//! Path parameter extractors

use warranty_core::Snowflake;

use crate::response::ApiError;

/// Path parameters with a code value (normalized by the engine)
#[derive(Debug, serde::Deserialize)]
pub struct CodePath {
    pub code: String,
}

/// Path parameters with user_id
#[derive(Debug, serde::Deserialize)]
pub struct UserIdPath {
    pub user_id: String,
}

impl UserIdPath {
    /// Parse user_id as Snowflake
    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        Snowflake::parse(&self.user_id).map_err(|_| ApiError::invalid_path("Invalid user_id format"))
    }
}
