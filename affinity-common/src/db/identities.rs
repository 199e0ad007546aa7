//! Identity database operations

use crate::db::models::{parse_guid, Identity};
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Create a new identity
pub async fn create_identity(
    pool: &SqlitePool,
    display_name: &str,
    parent_id: Option<Uuid>,
) -> Result<Identity> {
    if display_name.trim().is_empty() {
        return Err(Error::InvalidInput("display_name must not be empty".to_string()));
    }

    if let Some(parent) = parent_id {
        if !identity_exists(pool, parent).await? {
            return Err(Error::InvalidInput(format!("parent identity {} does not exist", parent)));
        }
    }

    let identity = Identity {
        id: Uuid::new_v4(),
        display_name: display_name.to_string(),
        parent_id,
    };

    sqlx::query("INSERT INTO identities (guid, display_name, parent_guid) VALUES (?, ?, ?)")
        .bind(identity.id.to_string())
        .bind(&identity.display_name)
        .bind(identity.parent_id.map(|id| id.to_string()))
        .execute(pool)
        .await?;

    Ok(identity)
}

/// Load identity by id
pub async fn load_identity(pool: &SqlitePool, identity_id: Uuid) -> Result<Option<Identity>> {
    let row = sqlx::query("SELECT guid, display_name, parent_guid FROM identities WHERE guid = ?")
        .bind(identity_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid: String = row.get("guid");
            let parent: Option<String> = row.get("parent_guid");
            Ok(Some(Identity {
                id: parse_guid(&guid)?,
                display_name: row.get("display_name"),
                parent_id: parent.as_deref().map(parse_guid).transpose()?,
            }))
        }
        None => Ok(None),
    }
}

pub async fn identity_exists(pool: &SqlitePool, identity_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM identities WHERE guid = ?)")
        .bind(identity_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_in_memory;

    #[tokio::test]
    async fn test_create_and_load_identity() {
        let pool = init_in_memory().await.unwrap();

        let parent = create_identity(&pool, "Family", None).await.unwrap();
        let child = create_identity(&pool, "Sam", Some(parent.id)).await.unwrap();

        let loaded = load_identity(&pool, child.id).await.unwrap().expect("identity not found");
        assert_eq!(loaded, child);
        assert_eq!(loaded.parent_id, Some(parent.id));
        assert!(identity_exists(&pool, parent.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_identity() {
        let pool = init_in_memory().await.unwrap();
        let id = Uuid::new_v4();

        assert!(load_identity(&pool, id).await.unwrap().is_none());
        assert!(!identity_exists(&pool, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_identity_rejects_unknown_parent() {
        let pool = init_in_memory().await.unwrap();
        let result = create_identity(&pool, "Orphan", Some(Uuid::new_v4())).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_identity_rejects_blank_name() {
        let pool = init_in_memory().await.unwrap();
        let result = create_identity(&pool, "   ", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
