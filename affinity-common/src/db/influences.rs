//! Influence database operations

use crate::db::models::{checked_alignment, checked_position, parse_guid, Influence, NewInfluence};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::BTreeSet;
use uuid::Uuid;

const INFLUENCE_COLUMNS: &str = "guid, category_guid, name, alignment, position, mood_tags, metadata";

fn influence_from_row(row: &SqliteRow) -> Result<Influence> {
    let guid: String = row.get("guid");
    let category: String = row.get("category_guid");
    let mood_tags: String = row.get("mood_tags");
    let metadata: String = row.get("metadata");

    Ok(Influence {
        id: parse_guid(&guid)?,
        category_id: parse_guid(&category)?,
        name: row.get("name"),
        alignment: checked_alignment(row.get("alignment"))?,
        position: checked_position(row.get("position"))?,
        mood_tags: serde_json::from_str::<BTreeSet<String>>(&mood_tags)?,
        metadata: serde_json::from_str(&metadata)?,
    })
}

/// Save a new influence
pub async fn create_influence(pool: &SqlitePool, new: NewInfluence) -> Result<Influence> {
    if new.name.trim().is_empty() {
        return Err(Error::InvalidInput("influence name must not be empty".to_string()));
    }
    let alignment = checked_alignment(new.alignment)?;
    let position = checked_position(new.position)?;

    if crate::db::categories::load_category(pool, new.category_id).await?.is_none() {
        return Err(Error::NotFound(format!("category {}", new.category_id)));
    }

    let influence = Influence {
        id: Uuid::new_v4(),
        category_id: new.category_id,
        name: new.name,
        alignment,
        position,
        mood_tags: new.mood_tags,
        metadata: new.metadata,
    };

    sqlx::query(
        r#"
        INSERT INTO influences (guid, category_guid, name, alignment, position, mood_tags, metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(influence.id.to_string())
    .bind(influence.category_id.to_string())
    .bind(&influence.name)
    .bind(i64::from(influence.alignment))
    .bind(i64::from(influence.position))
    .bind(serde_json::to_string(&influence.mood_tags)?)
    .bind(serde_json::to_string(&influence.metadata)?)
    .execute(pool)
    .await?;

    Ok(influence)
}

/// Load influence by id
pub async fn load_influence(pool: &SqlitePool, influence_id: Uuid) -> Result<Option<Influence>> {
    let sql = format!("SELECT {} FROM influences WHERE guid = ?", INFLUENCE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(influence_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(influence_from_row).transpose()
}

/// All influences in any of the given categories
///
/// Ordered by position, then name, then id so repeated reads return the
/// same sequence.
pub async fn influences_in_categories(
    pool: &SqlitePool,
    category_ids: &[Uuid],
) -> Result<Vec<Influence>> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM influences WHERE category_guid IN (",
        INFLUENCE_COLUMNS
    ));
    let mut separated = qb.separated(", ");
    for id in category_ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(")");
    qb.push(" ORDER BY position, name, guid");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(influence_from_row).collect()
}

/// Change an influence's alignment and position
pub async fn update_influence_ranking(
    pool: &SqlitePool,
    influence_id: Uuid,
    alignment: i64,
    position: i64,
) -> Result<Influence> {
    let alignment = checked_alignment(alignment)?;
    let position = checked_position(position)?;

    let result = sqlx::query(
        "UPDATE influences SET alignment = ?, position = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(i64::from(alignment))
    .bind(i64::from(position))
    .bind(influence_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("influence {}", influence_id)));
    }

    load_influence(pool, influence_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("influence {}", influence_id)))
}

/// Delete an influence
pub async fn delete_influence(pool: &SqlitePool, influence_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM influences WHERE guid = ?")
        .bind(influence_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("influence {}", influence_id)));
    }
    Ok(())
}

/// Owning identity of an influence, through its category
pub async fn influence_owner(pool: &SqlitePool, influence_id: Uuid) -> Result<Option<Uuid>> {
    let owner: Option<String> = sqlx::query_scalar(
        r#"
        SELECT c.identity_guid
        FROM influences i
        JOIN categories c ON i.category_guid = c.guid
        WHERE i.guid = ?
        "#,
    )
    .bind(influence_id.to_string())
    .fetch_optional(pool)
    .await?;

    owner.as_deref().map(parse_guid).transpose()
}
