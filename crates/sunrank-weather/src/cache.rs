//! Persistent cache for the latest ranking snapshot.

use crate::error::WeatherError;
use crate::store::KeyValueStore;
use crate::types::RankingSnapshot;

/// A single snapshot slot in a [`KeyValueStore`].
///
/// Reads never fail: missing, unreadable and corrupt values all read as
/// absent. Validity is decided by the caller via
/// [`RankingSnapshot::is_valid`].
#[derive(Debug)]
pub struct RankingCache<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> RankingCache<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the stored snapshot, if any.
    ///
    /// A value that does not parse is evicted so the next run starts clean.
    pub fn read(&self) -> Option<RankingSnapshot> {
        let raw = match self.store.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read cache entry {}: {}", self.key, e);
                return None;
            }
        };

        match serde_json::from_str::<RankingSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry {}: {}", self.key, e);
                if let Err(e) = self.store.remove(&self.key) {
                    tracing::warn!("Failed to evict corrupt cache entry {}: {}", self.key, e);
                }
                None
            }
        }
    }

    /// Persist `snapshot`, replacing the previous one.
    ///
    /// Empty snapshots are rejected so a failed refresh can never overwrite
    /// usable data.
    pub fn write(&self, snapshot: &RankingSnapshot) -> Result<(), WeatherError> {
        if snapshot.data.is_empty() {
            return Err(WeatherError::Cache(
                "refusing to cache an empty ranking".to_string(),
            ));
        }

        let json = serde_json::to_string(snapshot)
            .map_err(|e| WeatherError::Cache(format!("serialize snapshot: {}", e)))?;
        self.store.write(&self.key, &json)?;

        tracing::debug!(
            "Cached {} cities under {} at {}",
            snapshot.data.len(),
            self.key,
            snapshot.timestamp
        );
        Ok(())
    }

    /// Remove the stored snapshot.
    pub fn clear(&self) -> Result<(), WeatherError> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::CityRanking;
    use std::sync::Arc;

    fn ranking(name: &str, hours: f64) -> CityRanking {
        CityRanking {
            name: format!("{}, Testland", name),
            short_name: name.to_string(),
            average_hours: hours,
            max_temp: Some(20.0),
            max_uv: None,
            forecast: Vec::new(),
        }
    }

    #[test]
    fn test_read_empty_store() {
        let cache = RankingCache::new(MemoryStore::new(), "ranking_cache");
        assert!(cache.read().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let cache = RankingCache::new(MemoryStore::new(), "ranking_cache");
        let snapshot = RankingSnapshot::new(42, vec![ranking("A", 5.0), ranking("B", 3.0)]);

        cache.write(&snapshot).unwrap();
        assert_eq!(cache.read(), Some(snapshot));
    }

    #[test]
    fn test_empty_snapshot_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let cache = RankingCache::new(Arc::clone(&store), "ranking_cache");

        let result = cache.write(&RankingSnapshot::new(1, Vec::new()));
        assert!(matches!(result, Err(WeatherError::Cache(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_entry_reads_as_absent_and_is_evicted() {
        let store = Arc::new(MemoryStore::new());
        store.write("ranking_cache", "{not json").unwrap();
        let cache = RankingCache::new(Arc::clone(&store), "ranking_cache");

        assert!(cache.read().is_none());
        assert_eq!(store.read("ranking_cache").unwrap(), None);
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let store = Arc::new(MemoryStore::new());
        store
            .write("ranking_cache", r#"{"timestamp":"yesterday","data":[]}"#)
            .unwrap();
        let cache = RankingCache::new(Arc::clone(&store), "ranking_cache");

        assert!(cache.read().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = RankingCache::new(MemoryStore::new(), "ranking_cache");
        cache
            .write(&RankingSnapshot::new(7, vec![ranking("A", 1.0)]))
            .unwrap();
        cache.clear().unwrap();
        assert!(cache.read().is_none());
    }
}
