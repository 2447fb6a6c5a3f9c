use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::models::{BloodGroup, DonorRecord};

/// Short-lived cache of store query results
///
/// Candidate pools are keyed by blood group. Any donor write through this
/// service invalidates every pool, since a single update can move a donor in
/// or out of a group's pool.
///
/// A pool fetched before an invalidation must never be stored after it, so
/// callers read [`CandidateCache::generation`] before querying the store and
/// hand it back to [`CandidateCache::insert`].
pub struct CandidateCache {
    pools: moka::future::Cache<BloodGroup, Vec<DonorRecord>>,
    generation: AtomicU64,
    ttl_secs: u64,
}

impl CandidateCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let pools = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            pools,
            generation: AtomicU64::new(0),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub async fn get(&self, blood_group: BloodGroup) -> Option<Vec<DonorRecord>> {
        let hit = self.pools.get(&blood_group).await;
        if hit.is_some() {
            tracing::trace!("Candidate cache hit: {}", blood_group);
        } else {
            tracing::trace!("Candidate cache miss: {}", blood_group);
        }
        hit
    }

    /// Bumped by every [`CandidateCache::invalidate_all`]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `pool` unless the cache was invalidated after `generation` was read
    ///
    /// Returns whether the pool was kept.
    pub async fn insert(&self, blood_group: BloodGroup, pool: Vec<DonorRecord>, generation: u64) -> bool {
        if self.generation() != generation {
            tracing::debug!("Discarding stale candidate pool for {}", blood_group);
            return false;
        }

        self.pools.insert(blood_group, pool).await;

        // An invalidation may have landed while the insert was in flight
        if self.generation() != generation {
            self.pools.invalidate(&blood_group).await;
            tracing::debug!("Discarding stale candidate pool for {}", blood_group);
            return false;
        }

        true
    }

    /// Drop every cached pool
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pools.invalidate_all();
        tracing::debug!("Invalidated candidate cache");
    }
}
