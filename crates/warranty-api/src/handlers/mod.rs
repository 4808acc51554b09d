//! HTTP request handlers
//!
//! Thin adapters from HTTP requests to the activation engine, the role
//! reconciler and the entitlement queries.

pub mod codes;
pub mod health;
pub mod members;
pub mod sweeps;
pub mod users;
