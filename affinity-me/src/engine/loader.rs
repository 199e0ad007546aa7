//! Candidate Loader
//!
//! Fetches every influence in the identity's categories of the requested
//! types. An identity with no matching categories or no influences yields an
//! empty list; only a missing identity is an error.

use affinity_common::db::{Influence, PreferenceStore};
use affinity_common::{Error, Result};
use tracing::debug;
use uuid::Uuid;

pub async fn load_candidates(
    store: &dyn PreferenceStore,
    identity_id: Uuid,
    category_types: &[String],
) -> Result<Vec<Influence>> {
    let (exists, categories) = tokio::try_join!(
        store.identity_exists(identity_id),
        store.categories_by_type(identity_id, category_types),
    )?;

    if !exists {
        return Err(Error::NotFound(format!("identity {}", identity_id)));
    }

    if categories.is_empty() {
        debug!(identity = %identity_id, types = ?category_types, "No matching categories");
        return Ok(Vec::new());
    }

    let category_ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let influences = store.influences_in_categories(&category_ids).await?;

    debug!(
        identity = %identity_id,
        categories = category_ids.len(),
        influences = influences.len(),
        "Loaded candidates"
    );

    Ok(influences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_common::db::categories::create_category;
    use affinity_common::db::identities::create_identity;
    use affinity_common::db::influences::create_influence;
    use affinity_common::db::{init_in_memory, NewInfluence, SqliteStore};

    fn types(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_loads_only_requested_types() {
        let pool = init_in_memory().await.unwrap();
        let identity = create_identity(&pool, "Ada", None).await.unwrap();
        let music = create_category(&pool, identity.id, None, "Music", "content").await.unwrap();
        let jazz = create_category(&pool, identity.id, Some(music.id), "Jazz", "content").await.unwrap();
        let values = create_category(&pool, identity.id, None, "Values", "principle").await.unwrap();

        create_influence(&pool, NewInfluence::new(music.id, "Radiohead", 80, 0)).await.unwrap();
        create_influence(&pool, NewInfluence::new(jazz.id, "Coltrane", 90, 1)).await.unwrap();
        create_influence(&pool, NewInfluence::new(values.id, "Honesty", 100, 0)).await.unwrap();

        let store = SqliteStore::new(pool);
        let loaded = load_candidates(&store, identity.id, &types(&["content"])).await.unwrap();

        let mut names: Vec<&str> = loaded.iter().map(|i| i.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Coltrane", "Radiohead"]);
    }

    #[tokio::test]
    async fn test_missing_identity_is_not_found() {
        let pool = init_in_memory().await.unwrap();
        let store = SqliteStore::new(pool);

        let result = load_candidates(&store, Uuid::new_v4(), &types(&["content"])).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_matching_categories_is_empty() {
        let pool = init_in_memory().await.unwrap();
        let identity = create_identity(&pool, "Ada", None).await.unwrap();
        let values = create_category(&pool, identity.id, None, "Values", "principle").await.unwrap();
        create_influence(&pool, NewInfluence::new(values.id, "Honesty", 100, 0)).await.unwrap();

        let store = SqliteStore::new(pool);
        let loaded = load_candidates(&store, identity.id, &types(&["content"])).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_categories_without_influences_is_empty() {
        let pool = init_in_memory().await.unwrap();
        let identity = create_identity(&pool, "Ada", None).await.unwrap();
        create_category(&pool, identity.id, None, "Music", "content").await.unwrap();

        let store = SqliteStore::new(pool);
        let loaded = load_candidates(&store, identity.id, &types(&["content"])).await.unwrap();
        assert!(loaded.is_empty());
    }
}
