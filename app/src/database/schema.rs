//! Database schema
//!
//! The schema version is kept in SQLite's `user_version` header field, so a
//! database file records its own version without a bookkeeping table. Each
//! migration runs in one transaction together with the version bump.

use crate::error::Result;
use sqlx::sqlite::SqlitePool;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "key-value store and scheduled notifications",
    sql: include_str!("migrations/001_initial_schema.sql"),
}];

/// Latest schema version this build knows how to create
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Schema version recorded in the database file (0 for a new file)
pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Bring the schema up to `latest_version`
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    let current = schema_version(pool).await?;
    if current >= latest_version() {
        tracing::debug!("Database schema is at version {}", current);
        return Ok(());
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        migrate(pool, migration).await?;
    }

    tracing::info!("Database schema upgraded from version {}", current);
    Ok(())
}

async fn migrate(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Migrating schema to version {}: {}",
        migration.version,
        migration.name
    );

    let mut tx = pool.begin().await?;

    for statement in migration.sql.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    // PRAGMA values cannot be bound as parameters
    let bump = format!("PRAGMA user_version = {}", migration.version);
    sqlx::query(&bump).execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(())
}
