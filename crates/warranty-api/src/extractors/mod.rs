//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, and path parameters.

mod auth;
mod path;
mod validated;

pub use auth::{Operator, ServiceAuth, OPERATOR_HEADER};
pub use path::{CodePath, UserIdPath};
pub use validated::{OptionalJson, ValidatedJson, ValidatedQuery};
