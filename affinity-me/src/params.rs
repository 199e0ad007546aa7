//! Engine tuning parameters
//!
//! Loaded once at startup from the `settings` table. A value that is missing,
//! unparsable or out of range falls back to its default with a warning, so a
//! bad edit never prevents the service from starting.

use affinity_common::db::settings::{self, load_settings};
use affinity_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

/// Multipliers and thresholds used by the scoring stages
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringParams {
    /// Exponent rate for `exp(-rate * position)`
    pub position_decay_rate: f64,
    /// Multiplier when the request mood is one of the influence's tags
    pub mood_bonus: f64,
    /// Multiplier for influences with no selection inside the lookback window
    pub novelty_boost: f64,
    /// Selections at most this many days old get `recent_penalty`
    pub recent_window_days: f64,
    pub recent_penalty: f64,
    /// Selections older than the recent window, up to this many days, get `cooling_penalty`
    pub cooling_window_days: f64,
    pub cooling_penalty: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            position_decay_rate: 0.1,
            mood_bonus: 1.2,
            novelty_boost: 1.5,
            recent_window_days: 5.0,
            recent_penalty: 0.7,
            cooling_window_days: 10.0,
            cooling_penalty: 0.9,
        }
    }
}

/// Everything the matching engine reads from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    /// Admission threshold applied to raw alignment
    pub min_alignment: u8,
    pub default_match_count: usize,
    pub max_match_count: usize,
    /// Hard cutoff for selection history, in days
    pub history_lookback_days: u32,
    /// Category type used when a request names none
    pub default_category_type: String,
    pub scoring: ScoringParams,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_alignment: 60,
            default_match_count: 10,
            max_match_count: 100,
            history_lookback_days: 20,
            default_category_type: "content".to_string(),
            scoring: ScoringParams::default(),
        }
    }
}

impl EngineParams {
    /// Load parameters from the settings table
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let values = load_settings(pool).await?;
        let params = Self::from_settings(&values);
        info!(
            min_alignment = params.min_alignment,
            lookback_days = params.history_lookback_days,
            default_count = params.default_match_count,
            default_category_type = %params.default_category_type,
            "Engine parameters loaded"
        );
        Ok(params)
    }

    /// Build parameters from raw setting values
    pub fn from_settings(values: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let scoring = &defaults.scoring;

        let min_alignment = read(values, settings::MIN_ALIGNMENT, defaults.min_alignment, |v| *v <= 100);
        let max_match_count = read(values, settings::MAX_MATCH_COUNT, defaults.max_match_count, |v| *v > 0);
        let default_match_count = read(values, settings::DEFAULT_MATCH_COUNT, defaults.default_match_count, |v| {
            *v > 0 && *v <= max_match_count
        });

        let history_lookback_days = read(values, settings::HISTORY_LOOKBACK_DAYS, defaults.history_lookback_days, |v| {
            (1..=MAX_LOOKBACK_DAYS).contains(v)
        });

        let position_decay_rate =
            read(values, settings::POSITION_DECAY_RATE, scoring.position_decay_rate, non_negative);
        let mood_bonus = read(values, settings::MOOD_BONUS, scoring.mood_bonus, positive);
        let novelty_boost = read(values, settings::NOVELTY_BOOST, scoring.novelty_boost, positive);
        let recent_window_days =
            read(values, settings::RECENT_WINDOW_DAYS, scoring.recent_window_days, non_negative);
        let recent_penalty = read(values, settings::RECENT_PENALTY, scoring.recent_penalty, positive);
        let cooling_window_days = read(values, settings::COOLING_WINDOW_DAYS, scoring.cooling_window_days, |v| {
            v.is_finite() && *v >= recent_window_days
        });
        let cooling_penalty = read(values, settings::COOLING_PENALTY, scoring.cooling_penalty, positive);

        let default_category_type = match values.get(settings::DEFAULT_CATEGORY_TYPE) {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            Some(_) => {
                warn!("Setting '{}' is blank, using default", settings::DEFAULT_CATEGORY_TYPE);
                defaults.default_category_type.clone()
            }
            None => defaults.default_category_type.clone(),
        };

        Self {
            min_alignment,
            default_match_count,
            max_match_count,
            history_lookback_days,
            default_category_type,
            scoring: ScoringParams {
                position_decay_rate,
                mood_bonus,
                novelty_boost,
                recent_window_days,
                recent_penalty,
                cooling_window_days,
                cooling_penalty,
            },
        }
    }
}

/// Longest accepted history window, about a century
const MAX_LOOKBACK_DAYS: u32 = 36_500;

fn positive(v: &f64) -> bool {
    v.is_finite() && *v > 0.0
}

fn non_negative(v: &f64) -> bool {
    v.is_finite() && *v >= 0.0
}

fn read<T>(values: &HashMap<String, String>, key: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    let Some(raw) = values.get(key) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => v,
        Ok(v) => {
            warn!("Setting '{}' value {} is out of range, using default {}", key, v, default);
            default
        }
        Err(_) => {
            warn!("Setting '{}' value '{}' is not valid, using default {}", key, raw, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_common::db::init_in_memory;
    use affinity_common::db::settings::{set_setting, DEFAULT_SETTINGS};

    fn settings_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_stored_defaults_match_compiled_defaults() {
        let params = EngineParams::from_settings(&settings_map(DEFAULT_SETTINGS));
        assert_eq!(params, EngineParams::default());
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let params = EngineParams::from_settings(&HashMap::new());
        assert_eq!(params, EngineParams::default());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let params = EngineParams::from_settings(&settings_map(&[
            (settings::MIN_ALIGNMENT, "250"),
            (settings::MOOD_BONUS, "lots"),
            (settings::NOVELTY_BOOST, "-1"),
            (settings::DEFAULT_MATCH_COUNT, "0"),
            (settings::DEFAULT_CATEGORY_TYPE, "  "),
            (settings::COOLING_WINDOW_DAYS, "2"),
        ]));

        assert_eq!(params, EngineParams::default());
    }

    #[test]
    fn test_valid_overrides_applied() {
        let params = EngineParams::from_settings(&settings_map(&[
            (settings::MIN_ALIGNMENT, "75"),
            (settings::HISTORY_LOOKBACK_DAYS, "30"),
            (settings::DEFAULT_CATEGORY_TYPE, " music "),
            (settings::MOOD_BONUS, "1.5"),
        ]));

        assert_eq!(params.min_alignment, 75);
        assert_eq!(params.history_lookback_days, 30);
        assert_eq!(params.default_category_type, "music");
        assert_eq!(params.scoring.mood_bonus, 1.5);
        assert_eq!(params.scoring.novelty_boost, 1.5);
    }

    #[test]
    fn test_lookback_out_of_range_falls_back() {
        for raw in ["4000000000", "36501", "0", "-5"] {
            let params = EngineParams::from_settings(&settings_map(&[(settings::HISTORY_LOOKBACK_DAYS, raw)]));
            assert_eq!(params.history_lookback_days, 20, "lookback {}", raw);
        }

        let params = EngineParams::from_settings(&settings_map(&[(settings::HISTORY_LOOKBACK_DAYS, "36500")]));
        assert_eq!(params.history_lookback_days, 36_500);
    }

    #[tokio::test]
    async fn test_load_from_database() {
        let pool = init_in_memory().await.unwrap();
        set_setting(&pool, settings::MIN_ALIGNMENT, "70").await.unwrap();

        let params = EngineParams::load(&pool).await.unwrap();
        assert_eq!(params.min_alignment, 70);
        assert_eq!(params.default_match_count, 10);
    }
}
