//! # warranty-db
//!
//! Database layer implementing the repository ports with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! Every state transition is a single conditional statement; the returned
//! row (or `rows_affected`) tells the caller whether its condition held.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warranty_db::pool::{create_pool, run_migrations, default_migrations_dir, PoolConfig};
//! use warranty_db::repositories::PgCodeRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::new("postgres://localhost/warranty")).await?;
//!     run_migrations(&pool, &default_migrations_dir()).await?;
//!     let codes = PgCodeRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{
    create_pool, default_migrations_dir, run_migrations, PgPool, PoolConfig,
};
pub use repositories::{
    PgAuditLogRepository, PgCodeRepository, PgEntitlementRepository, PgReminderRepository,
};
