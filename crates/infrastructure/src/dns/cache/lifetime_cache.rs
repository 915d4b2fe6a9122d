use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::hash::{BuildHasher, Hash};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    expire_at: Option<Instant>,
}

impl<V> Slot<V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }
}

type Shard<K, V> = Mutex<LruCache<K, Slot<V>, FxBuildHasher>>;

/// Fixed-capacity LRU split into independently locked shards.
///
/// Entries may carry a lifetime; an expired entry is dropped the first time a
/// read observes it.
pub struct LifetimeCache<K, V> {
    shards: Box<[Shard<K, V>]>,
    hasher: FxBuildHasher,
}

impl<K: Hash + Eq, V: Clone> LifetimeCache<K, V> {
    pub fn new(capacity: usize, shard_amount: usize) -> Self {
        let shard_amount = shard_amount.max(1).next_power_of_two();
        let per_shard =
            NonZeroUsize::new(capacity.div_ceil(shard_amount)).unwrap_or(NonZeroUsize::MIN);

        let shards = (0..shard_amount)
            .map(|_| Mutex::new(LruCache::with_hasher(per_shard, FxBuildHasher)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher: FxBuildHasher,
        }
    }

    #[inline]
    fn shard(&self, key: &K) -> MutexGuard<'_, LruCache<K, Slot<V>, FxBuildHasher>> {
        let index = (self.hasher.hash_one(key) as usize) & (self.shards.len() - 1);
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with_lifetime(key).map(|(value, _)| value)
    }

    /// Returns the value together with its absolute expiry, if it has one.
    pub fn get_with_lifetime(&self, key: &K) -> Option<(V, Option<Instant>)> {
        let mut shard = self.shard(key);
        let now = Instant::now();
        let expired = shard.get(key)?.is_expired(now);
        if expired {
            shard.pop(key);
            return None;
        }
        shard
            .peek(key)
            .map(|slot| (slot.value.clone(), slot.expire_at))
    }

    pub fn add(&self, key: K, value: V) {
        self.shard(&key).put(
            key,
            Slot {
                value,
                expire_at: None,
            },
        );
    }

    pub fn add_with_lifetime(&self, key: K, value: V, lifetime: Duration) {
        let expire_at = Instant::now() + lifetime;
        self.shard(&key).put(
            key,
            Slot {
                value,
                expire_at: Some(expire_at),
            },
        );
    }

    pub fn purge(&self) {
        for shard in self.shards.iter() {
            shard.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Entry count, including expired entries not yet observed by a read.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
