use compact_str::CompactString;
use dashmap::DashMap;
use ferrous_router_application::ports::RejectionStore;
use hickory_proto::rr::RecordType;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 65_536;
const EVICTION_BATCH_SIZE: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RejectionKey {
    transport: CompactString,
    name: CompactString,
    query_type: RecordType,
}

impl RejectionKey {
    fn new(transport: &str, name: &str, query_type: RecordType) -> Self {
        Self {
            transport: CompactString::from(transport),
            name: CompactString::from(name.to_ascii_lowercase()),
            query_type,
        }
    }
}

/// In-memory rejection store. Entries are forgotten after `timeout`; once
/// `capacity` is reached, expired entries are swept before an arbitrary live
/// one is evicted.
pub struct MemoryRejectionStore {
    entries: Arc<DashMap<RejectionKey, Instant, FxBuildHasher>>,
    timeout: Duration,
    capacity: usize,
}

impl MemoryRejectionStore {
    pub fn new(timeout: Duration) -> Self {
        Self::with_capacity(timeout, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(timeout: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(DashMap::with_capacity_and_hasher(capacity, FxBuildHasher)),
            timeout,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(entries: &DashMap<RejectionKey, Instant, FxBuildHasher>, capacity: usize) {
        if entries.len() < capacity {
            return;
        }
        let now = Instant::now();
        let expired: Vec<RejectionKey> = entries
            .iter()
            .filter(|entry| now >= *entry.value())
            .map(|entry| entry.key().clone())
            .take(EVICTION_BATCH_SIZE)
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        if entries.len() >= capacity {
            let victim = entries.iter().map(|entry| entry.key().clone()).next();
            if let Some(key) = victim {
                entries.remove(&key);
            }
        }
    }

    fn insert(
        entries: &DashMap<RejectionKey, Instant, FxBuildHasher>,
        key: RejectionKey,
        timeout: Duration,
        capacity: usize,
    ) {
        if !entries.contains_key(&key) {
            Self::evict(entries, capacity);
        }
        debug!(
            transport = %key.transport,
            name = %key.name,
            query_type = %key.query_type,
            "Remembering rejected response"
        );
        entries.insert(key, Instant::now() + timeout);
    }
}

impl RejectionStore for MemoryRejectionStore {
    fn load_rejected(&self, transport_tag: &str, name: &str, query_type: RecordType) -> bool {
        let key = RejectionKey::new(transport_tag, name, query_type);
        let expired = match self.entries.get(&key) {
            Some(expire_at) => Instant::now() >= *expire_at,
            None => return false,
        };
        if expired {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    fn save_rejected_async(&self, transport_tag: &str, name: &str, query_type: RecordType) {
        let key = RejectionKey::new(transport_tag, name, query_type);
        let timeout = self.timeout;
        let capacity = self.capacity;
        match Handle::try_current() {
            Ok(handle) => {
                let entries = Arc::clone(&self.entries);
                handle.spawn(async move {
                    Self::insert(&entries, key, timeout, capacity);
                });
            }
            Err(_) => Self::insert(&self.entries, key, timeout, capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_without_runtime_is_synchronous() {
        let store = MemoryRejectionStore::new(Duration::from_secs(60));
        assert!(!store.load_rejected("remote", "example.com.", RecordType::A));

        store.save_rejected_async("remote", "Example.com.", RecordType::A);
        assert!(store.load_rejected("remote", "example.com.", RecordType::A));
        assert!(!store.load_rejected("remote", "example.com.", RecordType::AAAA));
        assert!(!store.load_rejected("local", "example.com.", RecordType::A));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryRejectionStore::new(Duration::from_secs(30));
        store.save_rejected_async("remote", "example.com.", RecordType::A);
        tokio::task::yield_now().await;
        assert!(store.load_rejected("remote", "example.com.", RecordType::A));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!store.load_rejected("remote", "example.com.", RecordType::A));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_never_grows_past_capacity() {
        let store = MemoryRejectionStore::with_capacity(Duration::from_secs(3600), 128);
        for i in 0..5_000 {
            store.save_rejected_async("remote", &format!("host{i}.example."), RecordType::A);
        }
        assert_eq!(store.len(), 128);
        assert!(store.load_rejected("remote", "host4999.example.", RecordType::A));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_store_sweeps_expired_entries_first() {
        let store = MemoryRejectionStore::with_capacity(Duration::from_secs(30), 4);
        for i in 0..4 {
            store.save_rejected_async("remote", &format!("old{i}.example."), RecordType::A);
        }
        tokio::task::yield_now().await;
        assert_eq!(store.len(), 4);

        tokio::time::advance(Duration::from_secs(31)).await;
        store.save_rejected_async("remote", "fresh.example.", RecordType::A);
        tokio::task::yield_now().await;

        assert_eq!(store.len(), 1);
        assert!(store.load_rejected("remote", "fresh.example.", RecordType::A));
    }
}
