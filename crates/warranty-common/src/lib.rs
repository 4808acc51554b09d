//! # warranty-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, AppSettings, ConfigError, DatabaseConfig, DiscordConfig, EngineConfig,
    Environment, RoleConfig, ScheduleConfig, ServerConfig,
};
pub use error::{domain_status, AppError, AppResult};
pub use telemetry::{init_tracing, TracingConfig, TracingError};
