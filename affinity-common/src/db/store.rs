//! Read interface consumed by the matching engine
//!
//! The engine depends on [`PreferenceStore`] rather than on SQLite directly,
//! so it only ever sees the read operations it needs.

use crate::db::models::{Category, Influence, SelectionEvent};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Read-only access to stored preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn identity_exists(&self, identity_id: Uuid) -> Result<bool>;

    /// Categories of an identity whose type is one of `types`
    async fn categories_by_type(&self, identity_id: Uuid, types: &[String]) -> Result<Vec<Category>>;

    /// Influences belonging to any of the given categories
    async fn influences_in_categories(&self, category_ids: &[Uuid]) -> Result<Vec<Influence>>;

    /// Selection events for an identity at or after `since`
    async fn selections_since(&self, identity_id: Uuid, since: DateTime<Utc>) -> Result<Vec<SelectionEvent>>;
}

/// [`PreferenceStore`] backed by the SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn identity_exists(&self, identity_id: Uuid) -> Result<bool> {
        crate::db::identities::identity_exists(&self.pool, identity_id).await
    }

    async fn categories_by_type(&self, identity_id: Uuid, types: &[String]) -> Result<Vec<Category>> {
        crate::db::categories::categories_by_type(&self.pool, identity_id, types).await
    }

    async fn influences_in_categories(&self, category_ids: &[Uuid]) -> Result<Vec<Influence>> {
        crate::db::influences::influences_in_categories(&self.pool, category_ids).await
    }

    async fn selections_since(&self, identity_id: Uuid, since: DateTime<Utc>) -> Result<Vec<SelectionEvent>> {
        crate::db::selections::selections_since(&self.pool, identity_id, since).await
    }
}
