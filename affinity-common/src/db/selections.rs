//! Selection event log
//!
//! Append-only. Events are written by callers after acting on a match; the
//! matching engine only reads them.

use crate::db::models::{parse_guid, SelectionEvent};
use crate::time::{from_db_timestamp, is_storable, to_db_timestamp};
use crate::{Error, Result};
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

/// Append a selection event
///
/// The influence must belong to one of the identity's categories.
pub async fn record_selection(
    pool: &SqlitePool,
    identity_id: Uuid,
    influence_id: Uuid,
    selected_at: DateTime<Utc>,
) -> Result<SelectionEvent> {
    if !is_storable(selected_at) {
        return Err(Error::InvalidInput(format!(
            "selected_at {} is outside years 0000-9999",
            selected_at
        )));
    }

    if !crate::db::identities::identity_exists(pool, identity_id).await? {
        return Err(Error::NotFound(format!("identity {}", identity_id)));
    }

    match crate::db::influences::influence_owner(pool, influence_id).await? {
        None => return Err(Error::NotFound(format!("influence {}", influence_id))),
        Some(owner) if owner != identity_id => {
            return Err(Error::InvalidInput(format!(
                "influence {} does not belong to identity {}",
                influence_id, identity_id
            )))
        }
        Some(_) => {}
    }

    // Stored with microsecond precision
    let event = SelectionEvent {
        id: Uuid::new_v4(),
        identity_id,
        influence_id,
        selected_at: selected_at.trunc_subsecs(6),
    };

    sqlx::query(
        "INSERT INTO selection_events (guid, identity_guid, influence_guid, selected_at) VALUES (?, ?, ?, ?)",
    )
    .bind(event.id.to_string())
    .bind(event.identity_id.to_string())
    .bind(event.influence_id.to_string())
    .bind(to_db_timestamp(event.selected_at))
    .execute(pool)
    .await?;

    debug!(
        identity = %identity_id,
        influence = %influence_id,
        selected_at = %selected_at,
        "Recorded selection event"
    );

    Ok(event)
}

/// Events for an identity at or after `since`, oldest first
pub async fn selections_since(
    pool: &SqlitePool,
    identity_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<SelectionEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, identity_guid, influence_guid, selected_at
        FROM selection_events
        WHERE identity_guid = ? AND selected_at >= ?
        ORDER BY selected_at, guid
        "#,
    )
    .bind(identity_id.to_string())
    .bind(to_db_timestamp(since))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let guid: String = row.get("guid");
            let identity: String = row.get("identity_guid");
            let influence: String = row.get("influence_guid");
            let selected_at: String = row.get("selected_at");
            Ok(SelectionEvent {
                id: parse_guid(&guid)?,
                identity_id: parse_guid(&identity)?,
                influence_id: parse_guid(&influence)?,
                selected_at: from_db_timestamp(&selected_at)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::categories::create_category;
    use crate::db::identities::create_identity;
    use crate::db::influences::create_influence;
    use crate::db::init::init_in_memory;
    use crate::db::models::NewInfluence;
    use chrono::{Datelike, Duration};

    #[tokio::test]
    async fn test_record_and_read_window() {
        let pool = init_in_memory().await.unwrap();
        let identity = create_identity(&pool, "Ada", None).await.unwrap();
        let category = create_category(&pool, identity.id, None, "Music", "content").await.unwrap();
        let influence = create_influence(&pool, NewInfluence::new(category.id, "Song", 80, 0))
            .await
            .unwrap();

        let now = Utc::now();
        record_selection(&pool, identity.id, influence.id, now - Duration::days(30)).await.unwrap();
        let recent = record_selection(&pool, identity.id, influence.id, now - Duration::days(2))
            .await
            .unwrap();

        let events = selections_since(&pool, identity.id, now - Duration::days(20)).await.unwrap();
        assert_eq!(events, vec![recent]);
    }

    #[tokio::test]
    async fn test_record_rejects_foreign_influence() {
        let pool = init_in_memory().await.unwrap();
        let ada = create_identity(&pool, "Ada", None).await.unwrap();
        let bob = create_identity(&pool, "Bob", None).await.unwrap();
        let category = create_category(&pool, ada.id, None, "Music", "content").await.unwrap();
        let influence = create_influence(&pool, NewInfluence::new(category.id, "Song", 80, 0))
            .await
            .unwrap();

        let result = record_selection(&pool, bob.id, influence.id, Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = record_selection(&pool, ada.id, Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let result = record_selection(&pool, Uuid::new_v4(), influence.id, Utc::now()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_rejects_unstorable_year() {
        let pool = init_in_memory().await.unwrap();
        let identity = create_identity(&pool, "Ada", None).await.unwrap();
        let category = create_category(&pool, identity.id, None, "Music", "content").await.unwrap();
        let influence = create_influence(&pool, NewInfluence::new(category.id, "Song", 80, 0))
            .await
            .unwrap();

        let far_future = Utc::now().with_year(12000).unwrap();
        let result = record_selection(&pool, identity.id, influence.id, far_future).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let events = selections_since(&pool, identity.id, Utc::now() - Duration::days(20)).await.unwrap();
        assert!(events.is_empty());
    }
}
