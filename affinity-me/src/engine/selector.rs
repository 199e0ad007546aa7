//! Selector
//!
//! Admits candidates on raw alignment, ranks by score, truncates to the
//! requested count and rounds the score for output.

use affinity_common::db::Influence;
use serde::Serialize;

/// A candidate with its unrounded score; never serialized
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub influence: Influence,
    pub score: f64,
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    #[serde(flatten)]
    pub influence: Influence,
    /// Score rounded to one decimal place
    pub match_score: f64,
}

impl From<ScoredCandidate> for Match {
    fn from(candidate: ScoredCandidate) -> Self {
        Self {
            influence: candidate.influence,
            match_score: round_score(candidate.score),
        }
    }
}

pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Filter, rank and truncate
///
/// Admission looks at stored alignment only, so no contextual multiplier can
/// lift a weak preference over the threshold. The sort is stable: equal
/// scores keep their input order.
pub fn select(mut scored: Vec<ScoredCandidate>, min_alignment: u8, count: usize) -> Vec<Match> {
    scored.retain(|c| c.influence.alignment >= min_alignment);
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(count);
    scored.into_iter().map(Match::from).collect()
}
