//! Schema migrations

use std::path::{Path, PathBuf};

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;

/// Migrations shipped with this crate
pub fn default_migrations_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

/// Apply every pending migration found in `dir`
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<(), MigrateError> {
    let migrator = Migrator::new(dir).await?;
    tracing::info!(
        dir = %dir.display(),
        migrations = migrator.iter().count(),
        "Running database migrations"
    );
    migrator.run(pool).await
}
