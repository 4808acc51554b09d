//! Authentication extractors
//!
//! Every route behind `/api/v1` is called by a trusted collaborator holding the
//! shared bearer token. Operator routes additionally name the acting operator;
//! whether that operator is allowed to act is decided by the caller.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use warranty_core::Snowflake;

use crate::response::ApiError;
use crate::state::AppState;

/// Header carrying the acting operator's identity
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// Caller presented the configured API token
#[derive(Debug, Clone, Copy)]
pub struct ServiceAuth;

#[async_trait]
impl<S> FromRequestParts<S> for ServiceAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);
        if !token_matches(bearer.token(), &app_state.config().api.token) {
            tracing::warn!("Rejected request with invalid API token");
            return Err(ApiError::InvalidToken);
        }

        Ok(ServiceAuth)
    }
}

/// Authenticated operator request
#[derive(Debug, Clone, Copy)]
pub struct Operator {
    pub operator_id: Snowflake,
}

#[async_trait]
impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        ServiceAuth::from_request_parts(parts, state).await?;

        let operator_id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Snowflake::parse(v).ok())
            .ok_or(ApiError::MissingOperator)?;

        Ok(Operator { operator_id })
    }
}

/// Compare without short-circuiting on the first differing byte
fn token_matches(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
