//! Per-year dataset cache with fetch coalescing.
//!
//! Entries are append-only: once a year's dataset is cached it is never
//! replaced or evicted. Concurrent requests for a year that is not cached
//! yet share a single in-flight fetch and all observe its outcome. A
//! failed fetch leaves no entry behind, so a later request starts a fresh
//! fetch.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use ecopulse_score_models::Dataset;
use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};

use crate::{FetchError, ScoreSource};

type InflightFetch = Shared<BoxFuture<'static, Result<Arc<Dataset>, Arc<FetchError>>>>;

/// Error returned when a year's dataset could not be loaded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The fetch for this year failed. Nothing was cached.
    #[error("Data for {year} is unavailable: {source}")]
    Unavailable {
        /// The requested year.
        year: i32,
        /// The underlying fetch failure, shared by every coalesced caller.
        source: Arc<FetchError>,
    },
}

/// Lazily populated map of year -> [`Dataset`], backed by a
/// [`ScoreSource`].
pub struct DatasetCache {
    source: Arc<dyn ScoreSource>,
    entries: RwLock<BTreeMap<i32, Arc<Dataset>>>,
    inflight: Mutex<BTreeMap<i32, InflightFetch>>,
}

impl DatasetCache {
    /// Creates an empty cache in front of `source`.
    #[must_use]
    pub fn new(source: Arc<dyn ScoreSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(BTreeMap::new()),
            inflight: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the source this cache fetches from.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ScoreSource> {
        &self.source
    }

    /// Returns the cached dataset for `year` without fetching.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<Arc<Dataset>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&year)
            .cloned()
    }

    /// Returns `true` if a dataset for `year` is cached.
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        self.get(year).is_some()
    }

    /// Returns the cached years, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Seeds the cache with an already-fetched dataset.
    ///
    /// If `year` is already cached the existing entry is kept and
    /// returned.
    pub fn insert(&self, year: i32, dataset: Dataset) -> Arc<Dataset> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(year).or_insert_with(|| Arc::new(dataset)))
    }

    /// Returns the dataset for `year`, fetching it from the source if it
    /// is not cached yet.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the fetch fails. The cache is
    /// left without an entry for `year`.
    pub async fn ensure_loaded(&self, year: i32) -> Result<Arc<Dataset>, CacheError> {
        if let Some(dataset) = self.get(year) {
            return Ok(dataset);
        }

        let fetch = {
            let mut inflight = self.lock_inflight();

            // A fetch may have completed between the read above and
            // taking the in-flight lock.
            if let Some(dataset) = self.get(year) {
                return Ok(dataset);
            }

            inflight
                .entry(year)
                .or_insert_with(|| {
                    log::info!("Fetching {year} dataset from {}...", self.source.name());
                    let source = Arc::clone(&self.source);
                    async move {
                        source
                            .fetch_year(year)
                            .await
                            .map(Arc::new)
                            .map_err(Arc::new)
                    }
                    .boxed()
                    .shared()
                })
                .clone()
        };

        let result = fetch.clone().await;

        {
            let mut inflight = self.lock_inflight();

            // Only the first caller to finish does the bookkeeping, and
            // only if the slot still holds this fetch (a failed fetch may
            // already have been replaced by a retry).
            if inflight.get(&year).is_some_and(|f| f.ptr_eq(&fetch)) {
                inflight.remove(&year);
                match &result {
                    Ok(dataset) => {
                        self.entries
                            .write()
                            .unwrap_or_else(PoisonError::into_inner)
                            .entry(year)
                            .or_insert_with(|| Arc::clone(dataset));
                        log::debug!(
                            "Cached {year} {} dataset ({} cities)",
                            dataset.kind(),
                            dataset.city_count()
                        );
                    }
                    Err(e) => log::warn!("Failed to fetch {year} dataset: {e}"),
                }
            }
        }

        result.map_err(|source| CacheError::Unavailable { year, source })
    }

    fn lock_inflight(&self) -> MutexGuard<'_, BTreeMap<i32, InflightFetch>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use ecopulse_score_models::{CityScores, DatasetKind, Score, YearlyScores};
    use tokio::sync::Notify;

    use super::*;

    /// Test source that counts fetches, blocks each fetch until released,
    /// and fails while `failing` is set.
    struct GatedSource {
        calls: AtomicUsize,
        gate: Notify,
        gated: AtomicBool,
        failing: AtomicBool,
    }

    impl GatedSource {
        fn new(gated: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
                gated: AtomicBool::new(gated),
                failing: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScoreSource for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch_year(&self, year: i32) -> Result<Dataset, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.gated.load(Ordering::SeqCst) {
                self.gate.notified().await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(FetchError::NotFound { year });
            }
            let mut scores = CityScores::new();
            scores.insert("Adana", Some(Score::new(f64::from(year) / 40.0).unwrap()));
            Ok(Dataset::Annual(scores))
        }

        async fn fetch_yearly(&self) -> Result<YearlyScores, FetchError> {
            Ok(YearlyScores::new())
        }
    }

    #[tokio::test]
    async fn fetches_once_and_memoizes() {
        let source = GatedSource::new(false);
        let cache = DatasetCache::new(source.clone());

        assert!(cache.get(2021).is_none());
        let first = cache.ensure_loaded(2021).await.unwrap();
        let second = cache.ensure_loaded(2021).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
        assert!(cache.contains(2021));
        assert_eq!(cache.years(), vec![2021]);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_fetch() {
        let source = GatedSource::new(true);
        let cache = DatasetCache::new(source.clone());

        let (a, b, ()) = tokio::join!(
            cache.ensure_loaded(2022),
            cache.ensure_loaded(2022),
            async {
                tokio::task::yield_now().await;
                source.gate.notify_one();
            }
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_all_see_the_failure() {
        let source = GatedSource::new(true);
        source.failing.store(true, Ordering::SeqCst);
        let cache = DatasetCache::new(source.clone());

        let (a, b, ()) = tokio::join!(
            cache.ensure_loaded(2023),
            cache.ensure_loaded(2023),
            async {
                tokio::task::yield_now().await;
                source.gate.notify_one();
            }
        );

        assert!(matches!(a, Err(CacheError::Unavailable { year: 2023, .. })));
        assert!(matches!(b, Err(CacheError::Unavailable { year: 2023, .. })));
        assert_eq!(source.calls(), 1);
        assert!(!cache.contains(2023));
    }

    #[tokio::test]
    async fn failure_does_not_poison_later_attempts() {
        let source = GatedSource::new(false);
        source.failing.store(true, Ordering::SeqCst);
        let cache = DatasetCache::new(source.clone());

        let err = cache.ensure_loaded(2020).await.unwrap_err();
        assert!(err.to_string().contains("2020"));
        assert!(cache.get(2020).is_none());

        source.failing.store(false, Ordering::SeqCst);
        let dataset = cache.ensure_loaded(2020).await.unwrap();
        assert_eq!(dataset.kind(), DatasetKind::Annual);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn seeded_entries_are_not_refetched_or_replaced() {
        let source = GatedSource::new(false);
        let cache = DatasetCache::new(source.clone());

        let seeded = cache.insert(2027, Dataset::Annual(CityScores::new()));
        let again = cache.insert(2027, Dataset::Forecast(std::collections::BTreeMap::new()));
        assert!(Arc::ptr_eq(&seeded, &again));

        let loaded = cache.ensure_loaded(2027).await.unwrap();
        assert!(Arc::ptr_eq(&seeded, &loaded));
        assert_eq!(source.calls(), 0);
    }
}
