//! # warranty-worker
//!
//! Time-driven sweeps over the durable store:
//! - reminder sweep: one direct message per code and threshold (30 and 7 days)
//! - expiry sweep: clears lapsed warranty flags and removes the warranty role
//! - startup sweep: repairs roles lost while the process was down

pub mod jobs;
pub mod scheduler;

pub use jobs::{ExpiryReport, ReminderReport};
pub use scheduler::ExpirationScheduler;
