//! Memoization of expensive per-dataset artifacts.
//!
//! Keys carry the dataset version, so a reload invalidates everything by
//! bumping one counter; stale entries are shadowed, never scanned or
//! deleted. A cache belongs to one session and is not shared across
//! sessions.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use xxhash_rust::xxh3::Xxh3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    SpatialMap,
    TimeSeriesFigure,
    NormalizedTable,
}

/// Stable input identity of an artifact within one dataset version.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Entity(i64),
    Content(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub kind: ArtifactKind,
    pub dataset_version: u64,
    pub identity: Identity,
    pub params_hash: u64,
}

type Stored = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub failures: u64,
}

#[derive(Default)]
pub struct ArtifactCache {
    dataset_version: u64,
    entries: HashMap<ArtifactKey, Stored>,
    stats: CacheStats,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset_version(&self) -> u64 {
        self.dataset_version
    }

    /// Called once per successful dataset load.
    pub fn bump_dataset_version(&mut self) -> u64 {
        self.dataset_version += 1;
        debug!(target: "cache", version = self.dataset_version, "dataset version bumped");
        self.dataset_version
    }

    pub fn key(&self, kind: ArtifactKind, identity: Identity, params_hash: u64) -> ArtifactKey {
        ArtifactKey {
            kind,
            dataset_version: self.dataset_version,
            identity,
            params_hash,
        }
    }

    /// Returns the cached value for `(kind, version, identity, params)` or runs
    /// `compute` once and stores its result. Errors are returned to the caller
    /// and not stored, so the next request retries.
    pub fn get_or_compute<V, E, F>(
        &mut self,
        kind: ArtifactKind,
        identity: Identity,
        params_hash: u64,
        compute: F,
    ) -> Result<Arc<V>, E>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> Result<V, E>,
    {
        let key = self.key(kind, identity, params_hash);
        if let Some(stored) = self.entries.get(&key) {
            match Arc::clone(stored).downcast::<V>() {
                Ok(value) => {
                    self.stats.hits += 1;
                    return Ok(value);
                }
                Err(_) => warn!(target: "cache", ?key, "cached artifact has unexpected type; recomputing"),
            }
        }

        self.stats.misses += 1;
        match compute() {
            Ok(value) => {
                let value = Arc::new(value);
                debug!(target: "cache", ?key, "artifact computed");
                self.entries.insert(key, value.clone() as Stored);
                Ok(value)
            }
            Err(err) => {
                self.stats.failures += 1;
                debug!(target: "cache", ?key, "artifact computation failed");
                Err(err)
            }
        }
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored entries, including ones shadowed by older dataset versions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Streaming xxh3 over render parameters, so a parameter change is a
/// different key. Strings are terminated so adjacent fields cannot merge.
pub struct ParamsHash(Xxh3);

impl Default for ParamsHash {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamsHash {
    const FIELD_END: u8 = 0xff;

    pub fn new() -> Self {
        Self(Xxh3::new())
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.update(bytes);
        self
    }

    pub fn str(self, s: &str) -> Self {
        self.bytes(s.as_bytes()).bytes(&[Self::FIELD_END])
    }

    pub fn f64(self, v: f64) -> Self {
        self.bytes(&v.to_bits().to_le_bytes())
    }

    pub fn u64(self, v: u64) -> Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn finish(self) -> u64 {
        self.0.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn computes_once_per_key() {
        let mut cache = ArtifactCache::new();
        let calls = Cell::new(0);
        for _ in 0..3 {
            let v: Arc<u32> = cache
                .get_or_compute(ArtifactKind::SpatialMap, Identity::Entity(1), 0, || {
                    calls.set(calls.get() + 1);
                    Ok::<_, ()>(7)
                })
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn kinds_identities_and_params_are_distinct_keys() {
        let mut cache = ArtifactCache::new();
        let mut compute = |kind, identity, params| {
            cache
                .get_or_compute(kind, identity, params, || Ok::<_, ()>(0u8))
                .unwrap();
        };
        compute(ArtifactKind::SpatialMap, Identity::Entity(1), 0);
        compute(ArtifactKind::TimeSeriesFigure, Identity::Entity(1), 0);
        compute(ArtifactKind::SpatialMap, Identity::Entity(2), 0);
        compute(ArtifactKind::SpatialMap, Identity::Entity(1), 9);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn version_bump_shadows_old_entries() {
        let mut cache = ArtifactCache::new();
        let old_key = cache.key(ArtifactKind::SpatialMap, Identity::Entity(3), 0);
        cache
            .get_or_compute(ArtifactKind::SpatialMap, Identity::Entity(3), 0, || Ok::<_, ()>(1))
            .unwrap();
        cache.bump_dataset_version();

        let v: Arc<i32> = cache
            .get_or_compute(ArtifactKind::SpatialMap, Identity::Entity(3), 0, || Ok::<_, ()>(2))
            .unwrap();
        assert_eq!(*v, 2);
        assert!(cache.contains(&old_key));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn failures_are_not_stored() {
        let mut cache = ArtifactCache::new();
        let err = cache
            .get_or_compute(ArtifactKind::TimeSeriesFigure, Identity::Entity(0), 0, || {
                Err::<u8, _>("boom")
            })
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.is_empty());

        let v = cache
            .get_or_compute(ArtifactKind::TimeSeriesFigure, Identity::Entity(0), 0, || {
                Ok::<_, &str>(5u8)
            })
            .unwrap();
        assert_eq!(*v, 5);
        assert_eq!(cache.stats().failures, 1);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn params_hash_is_order_and_value_sensitive() {
        let a = ParamsHash::new().f64(0.1).u64(3).finish();
        let b = ParamsHash::new().f64(0.1).u64(3).finish();
        let c = ParamsHash::new().u64(3).f64(0.1).finish();
        let d = ParamsHash::new().f64(0.2).u64(3).finish();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(
            ParamsHash::new().str("ab").str("c").finish(),
            ParamsHash::new().str("a").str("bc").finish()
        );
    }

    #[test]
    fn params_hash_matches_one_shot_xxh3() {
        let streamed = ParamsHash::new().u64(7).f64(0.5).finish();
        let mut buf = 7u64.to_le_bytes().to_vec();
        buf.extend_from_slice(&0.5f64.to_bits().to_le_bytes());
        assert_eq!(streamed, xxhash_rust::xxh3::xxh3_64(&buf));
    }
}
