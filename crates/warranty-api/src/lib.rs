//! # warranty-api
//!
//! REST surface built with Axum, plus the Discord REST adapter that implements
//! the membership platform and notifier ports.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod platform;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run};
pub use state::AppState;
