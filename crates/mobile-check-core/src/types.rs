//! Common types used across the Mobile Check service.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier naming one stored payload.
///
/// Always a UUID v4 when generated. Parsing rejects anything that is not a
/// UUID, so an identifier is also safe to use as a file name.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Creates a new random `EntryId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier received from a caller.
    ///
    /// Returns `None` for strings that cannot name an entry.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A payload held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Identifier the payload is stored under.
    pub id: EntryId,
    /// When the payload was uploaded.
    pub created_at: DateTime<Utc>,
    /// The payload exactly as uploaded.
    pub payload: serde_json::Value,
}

impl StoredEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(id: EntryId, payload: serde_json::Value) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_entry_id_display_parse() {
        let id = EntryId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(EntryId::parse(&text), Some(id));
    }

    #[test]
    fn test_entry_id_rejects_garbage() {
        assert_eq!(EntryId::parse("does-not-exist"), None);
        assert_eq!(EntryId::parse("../../etc/passwd"), None);
        assert_eq!(EntryId::parse(""), None);
    }

    #[test]
    fn test_entry_ids_are_distinct() {
        let ids: HashSet<EntryId> = (0..1000).map(|_| EntryId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_stored_entry_serde() {
        let entry = StoredEntry::new(EntryId::new(), serde_json::json!({"a": 1}));
        let json = serde_json::to_string(&entry).unwrap();
        let back: StoredEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
