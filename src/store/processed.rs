//! Time-indexed record of the matches the pipeline has already handled.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{get_json, set_json, KvStore, StoreError};
use crate::models::pubg::MatchId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub match_id: MatchId,
    pub last_seen_at: DateTime<Utc>,
}

/// Persisted as a single JSON object `{match_id: rfc3339 timestamp}` under a
/// fixed key with no expiry. Growth is bounded by [`ProcessedMatches::prune`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessedMatches {
    entries: BTreeMap<MatchId, DateTime<Utc>>,
}

impl ProcessedMatches {
    pub async fn load(store: &dyn KvStore, key: &str) -> Result<Self, StoreError> {
        Ok(get_json(store, key).await?.unwrap_or_default())
    }

    pub async fn save(&self, store: &dyn KvStore, key: &str) -> Result<(), StoreError> {
        set_json(store, key, self, 0).await
    }

    /// Overwrites the stored map with an empty one.
    pub async fn force_clear(store: &dyn KvStore, key: &str) -> Result<(), StoreError> {
        Self::default().save(store, key).await
    }

    pub fn contains(&self, match_id: &str) -> bool {
        self.entries.contains_key(match_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a first observation. Already known matches keep their
    /// original timestamp so they age out on schedule.
    pub fn mark(&mut self, match_id: MatchId, seen_at: DateTime<Utc>) -> bool {
        match self.entries.entry(match_id) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(seen_at);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Drops every record older than `retention` and returns how many went.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, seen_at| now - *seen_at <= retention);
        before - self.entries.len()
    }

    pub fn records(&self) -> impl Iterator<Item = ProcessedRecord> + '_ {
        self.entries.iter().map(|(id, at)| ProcessedRecord {
            match_id: id.clone(),
            last_seen_at: *at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn mark_keeps_first_timestamp() {
        let mut processed = ProcessedMatches::default();

        assert!(processed.mark("m1".into(), at(1)));
        assert!(!processed.mark("m1".into(), at(5)));

        let records: Vec<_> = processed.records().collect();
        assert_eq!(
            records,
            vec![ProcessedRecord {
                match_id: "m1".into(),
                last_seen_at: at(1),
            }]
        );
    }

    #[test]
    fn prune_drops_only_entries_past_retention() {
        let mut processed = ProcessedMatches::default();
        processed.mark("old".into(), at(1));
        processed.mark("edge".into(), at(6));
        processed.mark("fresh".into(), at(19));

        let pruned = processed.prune(at(20), Duration::days(14));

        assert_eq!(pruned, 1);
        assert!(!processed.contains("old"));
        assert!(processed.contains("edge"));
        assert!(processed.contains("fresh"));
        assert!(processed
            .records()
            .all(|r| at(20) - r.last_seen_at <= Duration::days(14)));
    }

    #[tokio::test]
    async fn missing_key_loads_as_empty_and_saves_as_object() {
        let store = MemoryStore::new();
        let mut processed = ProcessedMatches::load(&store, "processed").await.unwrap();
        assert!(processed.is_empty());

        processed.mark("m1".into(), at(2));
        processed.save(&store, "processed").await.unwrap();

        let raw = store.get("processed").await.unwrap().unwrap();
        assert_eq!(raw, r#"{"m1":"2024-03-02T12:00:00Z"}"#);
        let reloaded = ProcessedMatches::load(&store, "processed").await.unwrap();
        assert_eq!(reloaded, processed);
    }

    #[tokio::test]
    async fn force_clear_empties_stored_map() {
        let store = MemoryStore::new();
        let mut processed = ProcessedMatches::default();
        processed.mark("m1".into(), at(2));
        processed.save(&store, "processed").await.unwrap();

        ProcessedMatches::force_clear(&store, "processed").await.unwrap();

        assert_eq!(store.get("processed").await.unwrap().as_deref(), Some("{}"));
    }
}
