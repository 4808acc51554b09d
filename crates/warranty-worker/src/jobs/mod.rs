//! Sweep jobs run by the scheduler
//!
//! Every job takes the clock as an argument and commits one user at a time.

pub mod expiry;
pub mod reminder;
pub mod startup;

pub use expiry::{run_expiry_sweep, ExpiryReport};
pub use reminder::{run_reminder_sweep, ReminderReport};
pub use startup::run_startup_sweep;
