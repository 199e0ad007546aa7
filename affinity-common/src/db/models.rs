//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::{Error, Result};

/// Highest storable alignment
pub const MAX_ALIGNMENT: i64 = 100;

/// A named preference profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub display_name: String,
    /// Inheritance link; not consulted by the matching engine
    pub parent_id: Option<Uuid>,
}

/// A node in an identity's category tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    /// Free-text type tag used by request filters
    pub category_type: String,
    /// 0 for roots
    pub depth: i64,
}

/// A single tagged preference item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Influence {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    /// Stated preference strength, 0..=100
    pub alignment: u8,
    /// Curation ordinal, lower is more prominent
    pub position: u32,
    pub mood_tags: BTreeSet<String>,
    pub metadata: serde_json::Value,
}

impl Influence {
    pub fn has_mood(&self, mood: &str) -> bool {
        self.mood_tags.contains(mood)
    }
}

/// Fields needed to create an influence
#[derive(Debug, Clone)]
pub struct NewInfluence {
    pub category_id: Uuid,
    pub name: String,
    pub alignment: i64,
    pub position: i64,
    pub mood_tags: BTreeSet<String>,
    pub metadata: serde_json::Value,
}

impl NewInfluence {
    pub fn new(category_id: Uuid, name: &str, alignment: i64, position: i64) -> Self {
        Self {
            category_id,
            name: name.to_string(),
            alignment,
            position,
            mood_tags: BTreeSet::new(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_moods<I, S>(mut self, moods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mood_tags = moods.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Record that an influence was surfaced or consumed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionEvent {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub influence_id: Uuid,
    pub selected_at: DateTime<Utc>,
}

/// Validate and narrow a stored alignment value
pub fn checked_alignment(alignment: i64) -> Result<u8> {
    if !(0..=MAX_ALIGNMENT).contains(&alignment) {
        return Err(Error::InvalidInput(format!(
            "alignment must be between 0 and {}, got {}",
            MAX_ALIGNMENT, alignment
        )));
    }
    Ok(alignment as u8)
}

/// Validate and narrow a stored position value
pub fn checked_position(position: i64) -> Result<u32> {
    u32::try_from(position).map_err(|_| {
        Error::InvalidInput(format!("position must be a non-negative integer, got {}", position))
    })
}

/// Parse a guid column
pub fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid stored guid '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_alignment_bounds() {
        assert_eq!(checked_alignment(0).unwrap(), 0);
        assert_eq!(checked_alignment(100).unwrap(), 100);
        assert!(matches!(checked_alignment(101), Err(Error::InvalidInput(_))));
        assert!(matches!(checked_alignment(-1), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_checked_position_rejects_negative() {
        assert_eq!(checked_position(7).unwrap(), 7);
        assert!(matches!(checked_position(-3), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_influence_serializes_mood_tags_as_array() {
        let influence = Influence {
            id: Uuid::nil(),
            category_id: Uuid::nil(),
            name: "Blue Train".to_string(),
            alignment: 90,
            position: 0,
            mood_tags: ["mellow", "focus"].iter().map(|s| s.to_string()).collect(),
            metadata: serde_json::json!({"artist": "John Coltrane"}),
        };

        let json = serde_json::to_value(&influence).unwrap();
        assert_eq!(json["mood_tags"], serde_json::json!(["focus", "mellow"]));
        assert_eq!(json["metadata"]["artist"], "John Coltrane");
        assert!(influence.has_mood("focus"));
        assert!(!influence.has_mood("Focus"));
    }
}
