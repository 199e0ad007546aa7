//! Affinity Matching Engine
//!
//! One request flows Candidate Loader → History Aggregator → Scoring
//! Function → Selector. The engine only reads from the Preference Store, so
//! identical requests with no intervening selection writes return identical
//! results.

pub mod history;
pub mod loader;
pub mod scoring;
pub mod selector;

use affinity_common::db::PreferenceStore;
use affinity_common::{time, Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::params::EngineParams;
use history::{load_history, HistoryMap};
use loader::load_candidates;
use scoring::ScoringContext;
pub use selector::{Match, ScoredCandidate};

/// A validated match request
#[derive(Debug, Clone, Default)]
pub struct MatchRequest {
    pub identity_id: Uuid,
    pub mood: Option<String>,
    /// Empty means the configured default type
    pub category_types: Vec<String>,
    /// `None` means the configured default count
    pub count: Option<i64>,
}

/// Stateless ranking over one identity's preferences
pub struct MatchEngine {
    store: Arc<dyn PreferenceStore>,
    params: Arc<EngineParams>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn PreferenceStore>, params: Arc<EngineParams>) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Rank the identity's influences for this request
    pub async fn find_matches(&self, request: &MatchRequest) -> Result<Vec<Match>> {
        self.find_matches_at(request, time::now()).await
    }

    /// [`find_matches`](Self::find_matches) against a fixed clock
    pub async fn find_matches_at(&self, request: &MatchRequest, now: DateTime<Utc>) -> Result<Vec<Match>> {
        let count = self.resolve_count(request.count)?;
        let category_types = self.resolve_category_types(&request.category_types);
        let mood = request.mood.as_deref().map(str::trim).filter(|m| !m.is_empty());

        debug!(
            identity = %request.identity_id,
            mood = ?mood,
            types = ?category_types,
            count,
            "Match request"
        );

        // Both reads must succeed; scoring without history would silently
        // drop the novelty boost.
        let (candidates, history) = tokio::try_join!(
            load_candidates(self.store.as_ref(), request.identity_id, &category_types),
            load_history(
                self.store.as_ref(),
                request.identity_id,
                now,
                self.params.history_lookback_days
            ),
        )?;

        let context = ScoringContext { mood, now };
        let scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|influence| {
                let entry = history.get(&influence.id);
                let score = scoring::score(&influence, &context, entry, &self.params.scoring);
                trace!(
                    influence = %influence.id,
                    steps = ?scoring::breakdown(&influence, &context, entry, &self.params.scoring),
                    "Scored candidate"
                );
                ScoredCandidate { influence, score }
            })
            .collect();

        let candidate_count = scored.len();
        let matches = selector::select(scored, self.params.min_alignment, count);

        info!(
            identity = %request.identity_id,
            candidates = candidate_count,
            history_entries = history.len(),
            matches = matches.len(),
            "Matches selected"
        );

        Ok(matches)
    }

    /// Windowed selection history for an identity
    pub async fn history_at(&self, identity_id: Uuid, now: DateTime<Utc>) -> Result<HistoryMap> {
        let (exists, history) = tokio::try_join!(
            self.store.identity_exists(identity_id),
            load_history(self.store.as_ref(), identity_id, now, self.params.history_lookback_days),
        )?;

        if !exists {
            return Err(Error::NotFound(format!("identity {}", identity_id)));
        }
        Ok(history)
    }

    fn resolve_count(&self, requested: Option<i64>) -> Result<usize> {
        let Some(count) = requested else {
            return Ok(self.params.default_match_count);
        };

        match usize::try_from(count) {
            Ok(c) if c >= 1 && c <= self.params.max_match_count => Ok(c),
            _ => Err(Error::InvalidInput(format!(
                "count must be between 1 and {}, got {}",
                self.params.max_match_count, count
            ))),
        }
    }

    /// Trimmed, de-duplicated types; the default type when none remain
    fn resolve_category_types(&self, requested: &[String]) -> Vec<String> {
        let mut types: Vec<String> = Vec::with_capacity(requested.len());
        for t in requested.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !types.iter().any(|existing| existing == t) {
                types.push(t.to_string());
            }
        }

        if types.is_empty() {
            types.push(self.params.default_category_type.clone());
        }
        types
    }
}
