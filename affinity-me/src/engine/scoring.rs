//! Scoring Function
//!
//! Pure mapping from (influence, request context, history entry) to a score.
//! The score starts at the influence's alignment and passes through an
//! ordered list of multiplicative stages:
//!
//! 1. Position decay: `exp(-rate * position)`
//! 2. Mood affinity: bonus when the request mood is one of the influence's tags
//! 3. Recency: novelty boost when unseen in the window, suppression when recent
//!
//! Scores are only ever compared within one request.

use affinity_common::db::Influence;
use affinity_common::time::days_between;
use chrono::{DateTime, Utc};

use crate::engine::history::HistoryEntry;
use crate::params::ScoringParams;

/// Request-time inputs shared by every candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub mood: Option<&'a str>,
    /// Captured once per request
    pub now: DateTime<Utc>,
}

/// Everything a stage may look at for one candidate
pub struct StageInput<'a> {
    pub influence: &'a Influence,
    pub context: &'a ScoringContext<'a>,
    pub history: Option<&'a HistoryEntry>,
    pub params: &'a ScoringParams,
}

/// One multiplicative stage: running score in, adjusted score out
pub type Stage = fn(f64, &StageInput<'_>) -> f64;

/// Scoring stages in application order
pub const STAGES: [(&str, Stage); 3] = [
    ("position_decay", position_decay),
    ("mood_affinity", mood_affinity),
    ("recency", recency),
];

pub fn position_decay(score: f64, input: &StageInput<'_>) -> f64 {
    score * (-input.params.position_decay_rate * f64::from(input.influence.position)).exp()
}

pub fn mood_affinity(score: f64, input: &StageInput<'_>) -> f64 {
    match input.context.mood {
        Some(mood) if input.influence.has_mood(mood) => score * input.params.mood_bonus,
        _ => score,
    }
}

/// Only the most recent selection matters; the count is ignored.
pub fn recency(score: f64, input: &StageInput<'_>) -> f64 {
    let params = input.params;
    let Some(entry) = input.history else {
        return score * params.novelty_boost;
    };

    let days = days_between(entry.last_selected_at, input.context.now);
    if days <= params.recent_window_days {
        score * params.recent_penalty
    } else if days <= params.cooling_window_days {
        score * params.cooling_penalty
    } else {
        score
    }
}

/// Score one candidate
pub fn score(
    influence: &Influence,
    context: &ScoringContext<'_>,
    history: Option<&HistoryEntry>,
    params: &ScoringParams,
) -> f64 {
    let input = StageInput {
        influence,
        context,
        history,
        params,
    };

    STAGES
        .iter()
        .fold(f64::from(influence.alignment), |running, (_, stage)| stage(running, &input))
}

/// Running score after each stage, for trace logging
pub fn breakdown(
    influence: &Influence,
    context: &ScoringContext<'_>,
    history: Option<&HistoryEntry>,
    params: &ScoringParams,
) -> Vec<(&'static str, f64)> {
    let input = StageInput {
        influence,
        context,
        history,
        params,
    };

    let mut running = f64::from(influence.alignment);
    let mut steps = vec![("alignment", running)];
    for (name, stage) in STAGES.iter() {
        running = stage(running, &input);
        steps.push((*name, running));
    }
    steps
}
