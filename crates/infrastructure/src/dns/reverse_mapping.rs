use super::cache::LifetimeCache;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Address to domain mapping learned from answers, kept for the record TTL.
pub struct ReverseMapping {
    cache: LifetimeCache<IpAddr, Arc<str>>,
}

impl ReverseMapping {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LifetimeCache::new(capacity.max(1), 4),
        }
    }

    pub fn record(&self, address: IpAddr, domain: &str, ttl: u32) {
        if ttl == 0 {
            return;
        }
        self.cache.add_with_lifetime(
            address,
            Arc::from(domain),
            Duration::from_secs(u64::from(ttl)),
        );
    }

    pub fn lookup(&self, address: IpAddr) -> Option<String> {
        self.cache.get(&address).map(|domain| domain.to_string())
    }

    pub fn clear(&self) {
        self.cache.purge();
    }
}
