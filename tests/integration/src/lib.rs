//! Integration test utilities for the warranty engine
//!
//! In-memory port implementations, a wired service context and an in-process
//! HTTP harness. Nothing here needs a running database or Discord.

pub mod fakes;

pub use fakes::*;
pub use fixtures::*;
pub use helpers::*;
