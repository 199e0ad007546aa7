//! Category tree database operations
//!
//! Categories form a per-identity forest stored as rows with a parent id.
//! Writes check the ancestor chain so a category can never become its own
//! ancestor, and keep `depth` consistent with the parent links.

use crate::db::models::{parse_guid, Category};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "guid, identity_guid, parent_guid, name, category_type, depth";

fn category_from_row(row: &SqliteRow) -> Result<Category> {
    let guid: String = row.get("guid");
    let identity: String = row.get("identity_guid");
    let parent: Option<String> = row.get("parent_guid");

    Ok(Category {
        id: parse_guid(&guid)?,
        identity_id: parse_guid(&identity)?,
        parent_id: parent.as_deref().map(parse_guid).transpose()?,
        name: row.get("name"),
        category_type: row.get("category_type"),
        depth: row.get("depth"),
    })
}

/// Create a category under an identity, optionally below a parent
pub async fn create_category(
    pool: &SqlitePool,
    identity_id: Uuid,
    parent_id: Option<Uuid>,
    name: &str,
    category_type: &str,
) -> Result<Category> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("category name must not be empty".to_string()));
    }
    if category_type.trim().is_empty() {
        return Err(Error::InvalidInput("category type must not be empty".to_string()));
    }
    if !crate::db::identities::identity_exists(pool, identity_id).await? {
        return Err(Error::NotFound(format!("identity {}", identity_id)));
    }

    let depth = match parent_id {
        Some(parent) => checked_parent(pool, identity_id, parent).await?.depth + 1,
        None => 0,
    };

    let category = Category {
        id: Uuid::new_v4(),
        identity_id,
        parent_id,
        name: name.to_string(),
        category_type: category_type.to_string(),
        depth,
    };

    sqlx::query(
        r#"
        INSERT INTO categories (guid, identity_guid, parent_guid, name, category_type, depth)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(category.id.to_string())
    .bind(category.identity_id.to_string())
    .bind(category.parent_id.map(|id| id.to_string()))
    .bind(&category.name)
    .bind(&category.category_type)
    .bind(category.depth)
    .execute(pool)
    .await?;

    Ok(category)
}

/// Parent must exist and belong to the same identity
async fn checked_parent(pool: &SqlitePool, identity_id: Uuid, parent_id: Uuid) -> Result<Category> {
    let parent = load_category(pool, parent_id)
        .await?
        .ok_or_else(|| Error::InvalidInput(format!("parent category {} does not exist", parent_id)))?;

    if parent.identity_id != identity_id {
        return Err(Error::InvalidInput(format!(
            "parent category {} belongs to a different identity",
            parent_id
        )));
    }
    Ok(parent)
}

/// Load category by id
pub async fn load_category(pool: &SqlitePool, category_id: Uuid) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE guid = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(category_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(category_from_row).transpose()
}

/// All categories of an identity whose type is one of `types`
pub async fn categories_by_type(
    pool: &SqlitePool,
    identity_id: Uuid,
    types: &[String],
) -> Result<Vec<Category>> {
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM categories WHERE identity_guid = ",
        CATEGORY_COLUMNS
    ));
    qb.push_bind(identity_id.to_string());
    qb.push(" AND category_type IN (");
    let mut separated = qb.separated(", ");
    for category_type in types {
        separated.push_bind(category_type.clone());
    }
    separated.push_unseparated(")");
    qb.push(" ORDER BY depth, name, guid");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(category_from_row).collect()
}

/// Ids from `category_id`'s parent up to its root
///
/// Stops if a stored cycle is encountered rather than looping forever.
pub async fn ancestor_ids(pool: &SqlitePool, category_id: Uuid) -> Result<Vec<Uuid>> {
    let mut ancestors = Vec::new();
    let mut seen = HashSet::from([category_id]);
    let mut current = category_id;

    loop {
        let parent: Option<Option<String>> =
            sqlx::query_scalar("SELECT parent_guid FROM categories WHERE guid = ?")
                .bind(current.to_string())
                .fetch_optional(pool)
                .await?;

        let Some(parent) = parent.flatten() else {
            break;
        };
        let parent = parse_guid(&parent)?;
        if !seen.insert(parent) {
            return Err(Error::Internal(format!("category tree cycle detected at {}", parent)));
        }
        ancestors.push(parent);
        current = parent;
    }

    Ok(ancestors)
}

/// Re-parent a category, or make it a root with `None`
///
/// Rejects moves that would place the category below itself. Depths of the
/// moved subtree are recomputed.
pub async fn move_category(
    pool: &SqlitePool,
    category_id: Uuid,
    new_parent_id: Option<Uuid>,
) -> Result<Category> {
    let category = load_category(pool, category_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("category {}", category_id)))?;

    let new_depth = match new_parent_id {
        Some(parent_id) => {
            if parent_id == category_id {
                return Err(Error::InvalidInput("a category cannot be its own parent".to_string()));
            }
            let parent = checked_parent(pool, category.identity_id, parent_id).await?;
            if ancestor_ids(pool, parent_id).await?.contains(&category_id) {
                return Err(Error::InvalidInput(format!(
                    "moving category {} below {} would create a cycle",
                    category_id, parent_id
                )));
            }
            parent.depth + 1
        }
        None => 0,
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE categories SET parent_guid = ?, depth = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(new_parent_id.map(|id| id.to_string()))
    .bind(new_depth)
    .bind(category_id.to_string())
    .execute(&mut *tx)
    .await?;

    // Walk the moved subtree, assigning depth from each parent
    let mut frontier = vec![(category_id, new_depth)];
    while let Some((parent, parent_depth)) = frontier.pop() {
        let children: Vec<String> =
            sqlx::query_scalar("SELECT guid FROM categories WHERE parent_guid = ?")
                .bind(parent.to_string())
                .fetch_all(&mut *tx)
                .await?;

        for child in children {
            sqlx::query("UPDATE categories SET depth = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
                .bind(parent_depth + 1)
                .bind(&child)
                .execute(&mut *tx)
                .await?;
            frontier.push((parse_guid(&child)?, parent_depth + 1));
        }
    }

    tx.commit().await?;

    debug!(
        category = %category_id,
        parent = ?new_parent_id,
        depth = new_depth,
        "Moved category"
    );

    Ok(Category {
        parent_id: new_parent_id,
        depth: new_depth,
        ..category
    })
}
