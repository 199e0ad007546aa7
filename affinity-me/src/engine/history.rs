//! History Aggregator
//!
//! Reduces the selection log to one entry per influence: how many times it
//! was selected inside the lookback window and when it was last selected.
//! The window is a hard cutoff; anything older is indistinguishable from
//! never having been selected.

use affinity_common::db::{PreferenceStore, SelectionEvent};
use affinity_common::time::window_start;
use affinity_common::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Aggregate for one influence inside the window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub count: u32,
    pub last_selected_at: DateTime<Utc>,
}

pub type HistoryMap = HashMap<Uuid, HistoryEntry>;

/// Aggregate events falling inside `[now - lookback_days, now]`
///
/// Events after `now` (clock skew between writers) are kept; they count as
/// very recent.
pub fn aggregate_history<'a, I>(events: I, now: DateTime<Utc>, lookback_days: u32) -> Result<HistoryMap>
where
    I: IntoIterator<Item = &'a SelectionEvent>,
{
    let cutoff = window_start(now, lookback_days)?;
    let mut history = HistoryMap::new();

    for event in events.into_iter().filter(|e| e.selected_at >= cutoff) {
        history
            .entry(event.influence_id)
            .and_modify(|entry| {
                entry.count += 1;
                if event.selected_at > entry.last_selected_at {
                    entry.last_selected_at = event.selected_at;
                }
            })
            .or_insert(HistoryEntry {
                count: 1,
                last_selected_at: event.selected_at,
            });
    }

    Ok(history)
}

/// Read the identity's windowed selection log and aggregate it
pub async fn load_history(
    store: &dyn PreferenceStore,
    identity_id: Uuid,
    now: DateTime<Utc>,
    lookback_days: u32,
) -> Result<HistoryMap> {
    let events = store
        .selections_since(identity_id, window_start(now, lookback_days)?)
        .await?;
    aggregate_history(&events, now, lookback_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(influence_id: Uuid, at: DateTime<Utc>) -> SelectionEvent {
        SelectionEvent {
            id: Uuid::new_v4(),
            identity_id: Uuid::nil(),
            influence_id,
            selected_at: at,
        }
    }

    #[test]
    fn test_counts_and_latest_timestamp() {
        let now = Utc::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let events = vec![
            event(a, now - Duration::days(9)),
            event(a, now - Duration::days(1)),
            event(b, now - Duration::days(4)),
            event(a, now - Duration::days(3)),
        ];

        let history = aggregate_history(&events, now, 20).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[&a].count, 3);
        assert_eq!(history[&a].last_selected_at, now - Duration::days(1));
        assert_eq!(history[&b].count, 1);
    }

    #[test]
    fn test_events_outside_window_excluded() {
        let now = Utc::now();
        let stale = Uuid::new_v4();
        let mixed = Uuid::new_v4();
        let events = vec![
            event(stale, now - Duration::days(21)),
            event(stale, now - Duration::days(365)),
            event(mixed, now - Duration::days(25)),
            event(mixed, now - Duration::days(6)),
        ];

        let history = aggregate_history(&events, now, 20).unwrap();

        assert!(!history.contains_key(&stale));
        assert_eq!(history[&mixed].count, 1);
        assert_eq!(history[&mixed].last_selected_at, now - Duration::days(6));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let events = vec![event(id, now - Duration::days(20))];

        assert!(aggregate_history(&events, now, 20).unwrap().contains_key(&id));
    }

    #[test]
    fn test_empty_log() {
        let history = aggregate_history(&Vec::<SelectionEvent>::new(), Utc::now(), 20).unwrap();
        assert!(history.is_empty());
    }
}
