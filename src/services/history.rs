//! Recommendation history.
//!
//! Remembers which tracks were already shown for a filter combination so later
//! requests prefer fresh candidates. Storage is pluggable through
//! [`HistoryStore`]; operations on one key are serialized by a per-key lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedMutexGuard, RwLock};

use crate::{
    error::AppResult,
    models::{CandidateTrack, HistoryKey, TrackIdentity},
};

/// Fewer fresh candidates than this clears the key's history
pub const MIN_FRESH_CANDIDATES: usize = 5;

/// Backing storage for recommendation history
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Identities recorded under `key`
    async fn recorded(&self, key: &HistoryKey) -> AppResult<HashSet<TrackIdentity>>;

    /// Adds identities under `key`
    async fn add(&self, key: &HistoryKey, identities: &[TrackIdentity]) -> AppResult<()>;

    /// Forgets everything recorded under `key`
    async fn clear(&self, key: &HistoryKey) -> AppResult<()>;
}

/// Process-lifetime store
#[derive(Default)]
pub struct MemoryHistoryStore {
    sets: RwLock<HashMap<HistoryKey, HashSet<TrackIdentity>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn recorded(&self, key: &HistoryKey) -> AppResult<HashSet<TrackIdentity>> {
        let sets = self.sets.read().await;
        Ok(sets.get(key).cloned().unwrap_or_default())
    }

    async fn add(&self, key: &HistoryKey, identities: &[TrackIdentity]) -> AppResult<()> {
        let mut sets = self.sets.write().await;
        sets.entry(key.clone())
            .or_default()
            .extend(identities.iter().cloned());
        Ok(())
    }

    async fn clear(&self, key: &HistoryKey) -> AppResult<()> {
        let mut sets = self.sets.write().await;
        sets.remove(key);
        Ok(())
    }
}

/// Tracks already-recommended songs per [`HistoryKey`]
pub struct HistoryTracker {
    store: Arc<dyn HistoryStore>,
    key_locks: Mutex<HashMap<HistoryKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl HistoryTracker {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            store,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryHistoryStore::new()))
    }

    async fn lock_key(&self, key: &HistoryKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    async fn filter_new_locked(
        &self,
        pool: &[CandidateTrack],
        key: &HistoryKey,
    ) -> AppResult<Vec<CandidateTrack>> {
        let recorded = self.store.recorded(key).await?;
        Ok(pool
            .iter()
            .filter(|track| !recorded.contains(&track.identity()))
            .cloned()
            .collect())
    }

    /// Pool entries not yet recommended under `key`
    pub async fn filter_new(
        &self,
        pool: &[CandidateTrack],
        key: &HistoryKey,
    ) -> AppResult<Vec<CandidateTrack>> {
        let _guard = self.lock_key(key).await;
        self.filter_new_locked(pool, key).await
    }

    /// Remembers identities as recommended under `key`
    pub async fn record(&self, identities: &[TrackIdentity], key: &HistoryKey) -> AppResult<()> {
        if identities.is_empty() {
            return Ok(());
        }
        let _guard = self.lock_key(key).await;
        self.store.add(key, identities).await?;
        tracing::debug!(key = %key, count = identities.len(), "Recorded recommendations");
        Ok(())
    }

    /// Clears `key` when fewer than [`MIN_FRESH_CANDIDATES`] of `pool` are still fresh.
    /// Returns whether the history was cleared.
    pub async fn reset_if_exhausted(
        &self,
        pool: &[CandidateTrack],
        key: &HistoryKey,
    ) -> AppResult<bool> {
        let _guard = self.lock_key(key).await;
        let fresh = self.filter_new_locked(pool, key).await?;
        if fresh.len() < MIN_FRESH_CANDIDATES {
            self.store.clear(key).await?;
            tracing::info!(key = %key, fresh = fresh.len(), "Recommendation history cleared");
            return Ok(true);
        }
        Ok(false)
    }

    /// Candidates for this request: the fresh entries when there are enough,
    /// otherwise the full pool with the key's history cleared.
    ///
    /// Runs under a single lock for the key. Store failures fall back to the
    /// full pool.
    pub async fn select_candidates(
        &self,
        pool: &[CandidateTrack],
        key: &HistoryKey,
    ) -> Vec<CandidateTrack> {
        let _guard = self.lock_key(key).await;

        let fresh = match self.filter_new_locked(pool, key).await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "History lookup failed, using full pool");
                return pool.to_vec();
            }
        };

        tracing::info!(
            key = %key,
            pool = pool.len(),
            fresh = fresh.len(),
            "Filtered previously recommended tracks"
        );

        if fresh.len() >= MIN_FRESH_CANDIDATES {
            return fresh;
        }

        if let Err(e) = self.store.clear(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to clear recommendation history");
        } else {
            tracing::info!(key = %key, fresh = fresh.len(), "Too few fresh tracks, history cleared");
        }
        pool.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterSet;

    fn pool(count: usize) -> Vec<CandidateTrack> {
        (0..count)
            .map(|i| CandidateTrack::new(format!("Song {}", i), "Artist"))
            .collect()
    }

    fn key() -> HistoryKey {
        HistoryKey::from_filters(&FilterSet {
            genre: Some("Jazz".to_string()),
            ..Default::default()
        })
    }

    fn identities(tracks: &[CandidateTrack]) -> Vec<TrackIdentity> {
        tracks.iter().map(CandidateTrack::identity).collect()
    }

    #[tokio::test]
    async fn test_filter_new_excludes_recorded() {
        let tracker = HistoryTracker::in_memory();
        let pool = pool(12);

        tracker.record(&identities(&pool[..5]), &key()).await.unwrap();
        let fresh = tracker.filter_new(&pool, &key()).await.unwrap();

        assert_eq!(fresh.len(), 7);
        assert!(fresh.iter().all(|t| !pool[..5].contains(t)));
    }

    #[tokio::test]
    async fn test_record_is_case_insensitive() {
        let tracker = HistoryTracker::in_memory();
        let upper = CandidateTrack::new("SO WHAT", "MILES DAVIS");
        let lower = CandidateTrack::new("so what", "miles davis");

        tracker.record(&[upper.identity()], &key()).await.unwrap();
        let fresh = tracker.filter_new(&[lower], &key()).await.unwrap();
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let tracker = HistoryTracker::in_memory();
        let pool = pool(6);
        let other = HistoryKey::from_filters(&FilterSet::default());

        tracker.record(&identities(&pool), &key()).await.unwrap();
        assert_eq!(tracker.filter_new(&pool, &other).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_select_candidates_prefers_fresh() {
        let tracker = HistoryTracker::in_memory();
        let pool = pool(20);
        tracker.record(&identities(&pool[..5]), &key()).await.unwrap();

        let selected = tracker.select_candidates(&pool, &key()).await;
        assert_eq!(selected.len(), 15);
    }

    #[tokio::test]
    async fn test_select_candidates_resets_when_exhausted() {
        let tracker = HistoryTracker::in_memory();
        let pool = pool(8);
        tracker.record(&identities(&pool[..4]), &key()).await.unwrap();

        let selected = tracker.select_candidates(&pool, &key()).await;
        assert_eq!(selected.len(), 8);

        // History was cleared, so everything is fresh again
        let fresh = tracker.filter_new(&pool, &key()).await.unwrap();
        assert_eq!(fresh.len(), 8);
    }

    #[tokio::test]
    async fn test_reset_if_exhausted() {
        let tracker = HistoryTracker::in_memory();
        let pool = pool(10);

        assert!(!tracker.reset_if_exhausted(&pool, &key()).await.unwrap());

        tracker.record(&identities(&pool[..6]), &key()).await.unwrap();
        assert!(tracker.reset_if_exhausted(&pool, &key()).await.unwrap());
        assert_eq!(tracker.filter_new(&pool, &key()).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_concurrent_records_are_not_lost() {
        let tracker = Arc::new(HistoryTracker::in_memory());
        let pool = pool(40);

        let mut tasks = Vec::new();
        for chunk in pool.chunks(5) {
            let tracker = tracker.clone();
            let ids = identities(chunk);
            tasks.push(tokio::spawn(async move {
                tracker.record(&ids, &key()).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(tracker.filter_new(&pool, &key()).await.unwrap().is_empty());
    }
}
