//! Database initialization
//!
//! Creates the database file and schema on first run and fills in default
//! settings. Every step is idempotent, so opening an existing database runs
//! the same sequence.

use crate::db::settings::init_default_settings;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets request reads proceed alongside selection writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to one connection: every SQLite memory connection is a separate
/// database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and default settings
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_settings_table(pool).await?;
    create_identities_table(pool).await?;
    create_categories_table(pool).await?;
    create_influences_table(pool).await?;
    create_selection_events_table(pool).await?;

    init_default_settings(pool).await?;

    Ok(())
}

/// Create the settings table
///
/// Stores operator-tunable key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_identities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            guid TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            parent_guid TEXT REFERENCES identities(guid) ON DELETE SET NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            guid TEXT PRIMARY KEY,
            identity_guid TEXT NOT NULL REFERENCES identities(guid) ON DELETE CASCADE,
            parent_guid TEXT REFERENCES categories(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category_type TEXT NOT NULL,
            depth INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (depth >= 0),
            CHECK (parent_guid IS NULL OR parent_guid != guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_categories_identity_type ON categories(identity_guid, category_type)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_influences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS influences (
            guid TEXT PRIMARY KEY,
            category_guid TEXT NOT NULL REFERENCES categories(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            alignment INTEGER NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            mood_tags TEXT NOT NULL DEFAULT '[]',
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (alignment >= 0 AND alignment <= 100),
            CHECK (position >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_influences_category ON influences(category_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the selection_events table
///
/// Append-only. `influence_guid` carries no foreign key so history survives
/// deletion of the influence; retention is handled outside this service.
async fn create_selection_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS selection_events (
            guid TEXT PRIMARY KEY,
            identity_guid TEXT NOT NULL REFERENCES identities(guid) ON DELETE CASCADE,
            influence_guid TEXT NOT NULL,
            selected_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_selection_events_identity_time ON selection_events(identity_guid, selected_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
