//! Database connection pool management

mod migrate;
mod postgres;

pub use migrate::{default_migrations_dir, run_migrations};
pub use postgres::{create_pool, PoolConfig};

// Re-export PgPool for convenience
pub use sqlx::postgres::PgPool;
