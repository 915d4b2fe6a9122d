mod cached_message;
mod key;
mod lifetime_cache;

pub use cached_message::CachedMessage;
pub use key::CacheKey;
pub use lifetime_cache::LifetimeCache;
