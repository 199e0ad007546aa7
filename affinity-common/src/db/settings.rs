//! Settings table access
//!
//! Engine tuning constants are stored as text key-value pairs. Defaults are
//! written on database initialization; operators edit the table to tune.

use crate::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::{info, warn};

pub const MIN_ALIGNMENT: &str = "min_alignment";
pub const DEFAULT_MATCH_COUNT: &str = "default_match_count";
pub const MAX_MATCH_COUNT: &str = "max_match_count";
pub const HISTORY_LOOKBACK_DAYS: &str = "history_lookback_days";
pub const DEFAULT_CATEGORY_TYPE: &str = "default_category_type";
pub const POSITION_DECAY_RATE: &str = "position_decay_rate";
pub const MOOD_BONUS: &str = "mood_bonus";
pub const NOVELTY_BOOST: &str = "novelty_boost";
pub const RECENT_WINDOW_DAYS: &str = "recent_window_days";
pub const RECENT_PENALTY: &str = "recent_penalty";
pub const COOLING_WINDOW_DAYS: &str = "cooling_window_days";
pub const COOLING_PENALTY: &str = "cooling_penalty";

/// Default value for every engine setting
///
/// These match `EngineParams::default()` in affinity-me.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    (MIN_ALIGNMENT, "60"),
    (DEFAULT_MATCH_COUNT, "10"),
    (MAX_MATCH_COUNT, "100"),
    (HISTORY_LOOKBACK_DAYS, "20"),
    (DEFAULT_CATEGORY_TYPE, "content"),
    (POSITION_DECAY_RATE, "0.1"),
    (MOOD_BONUS, "1.2"),
    (NOVELTY_BOOST, "1.5"),
    (RECENT_WINDOW_DAYS, "5"),
    (RECENT_PENALTY, "0.7"),
    (COOLING_WINDOW_DAYS, "10"),
    (COOLING_PENALTY, "0.9"),
];

/// Insert any missing defaults
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    for (key, value) in DEFAULT_SETTINGS {
        ensure_setting(pool, key, value).await?;
    }
    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// A missing setting is created with the default. An existing setting with a
/// NULL value is reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let existing: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match existing {
        None => {
            // INSERT OR IGNORE: two services may initialize concurrently
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}

/// Read one setting
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value.flatten())
}

/// Write one setting
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Read every non-NULL setting
pub async fn load_settings(pool: &SqlitePool) -> Result<HashMap<String, String>> {
    let rows = sqlx::query("SELECT key, value FROM settings WHERE value IS NOT NULL")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("key"), row.get::<String, _>("value")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_in_memory;

    #[tokio::test]
    async fn test_defaults_written_on_init() {
        let pool = init_in_memory().await.unwrap();
        let settings = load_settings(&pool).await.unwrap();

        for (key, value) in DEFAULT_SETTINGS {
            assert_eq!(settings.get(*key).map(String::as_str), Some(*value), "setting {}", key);
        }
    }

    #[tokio::test]
    async fn test_ensure_setting_keeps_operator_value() {
        let pool = init_in_memory().await.unwrap();
        set_setting(&pool, MIN_ALIGNMENT, "75").await.unwrap();

        ensure_setting(&pool, MIN_ALIGNMENT, "60").await.unwrap();

        assert_eq!(get_setting(&pool, MIN_ALIGNMENT).await.unwrap().as_deref(), Some("75"));
    }

    #[tokio::test]
    async fn test_ensure_setting_resets_null() {
        let pool = init_in_memory().await.unwrap();
        sqlx::query("UPDATE settings SET value = NULL WHERE key = ?")
            .bind(MOOD_BONUS)
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(get_setting(&pool, MOOD_BONUS).await.unwrap(), None);

        ensure_setting(&pool, MOOD_BONUS, "1.2").await.unwrap();

        assert_eq!(get_setting(&pool, MOOD_BONUS).await.unwrap().as_deref(), Some("1.2"));
    }
}
