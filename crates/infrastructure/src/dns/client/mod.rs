//! Caching DNS client.
//!
//! Owns the message cache and performs single exchanges against a transport
//! chosen by the caller: cache reads with TTL aging and optional
//! round-robin, strategy gating, loopback detection, rejection checks and
//! TTL normalization before a response is cached.

mod lookup;
mod refresh;
mod ttl;

use super::cache::{CacheKey, CachedMessage, LifetimeCache};
use super::message::{
    fixed_response, format_error_response, format_question, has_client_subnet,
    message_to_addresses, set_client_subnet, strip_https_hints,
};
use ferrous_router_application::ports::{DnsTransport, RejectionStore};
use ferrous_router_application::{QueryContext, QueryOptions};
use ferrous_router_domain::{DnsConfig, DomainError, DomainStrategy};
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::RecordType;
use refresh::RefreshSet;
use std::borrow::Cow;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Verdict over the addresses of a provisional answer. `false` rejects it.
pub type ResponseChecker<'a> = &'a (dyn Fn(&[IpAddr]) -> bool + Send + Sync);

const MIN_CACHE_CAPACITY: usize = 1024;
const DEFAULT_MAX_CACHE_TTL: u32 = 86_400;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub disable_cache: bool,
    pub disable_expire: bool,
    pub independent_cache: bool,
    pub round_robin_cache: bool,
    /// Seconds of stale grace. 0 disables stale serving.
    pub stale_cache: u32,
    pub cache_capacity: usize,
    pub cache_shard_amount: usize,
    pub min_cache_ttl: u32,
    pub max_cache_ttl: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            disable_cache: false,
            disable_expire: false,
            independent_cache: false,
            round_robin_cache: false,
            stale_cache: 0,
            cache_capacity: MIN_CACHE_CAPACITY,
            cache_shard_amount: 16,
            min_cache_ttl: 0,
            max_cache_ttl: DEFAULT_MAX_CACHE_TTL,
        }
    }
}

impl From<&DnsConfig> for ClientOptions {
    fn from(config: &DnsConfig) -> Self {
        Self {
            timeout: config.query_timeout_duration(),
            disable_cache: config.disable_cache,
            disable_expire: config.disable_expire,
            independent_cache: config.independent_cache,
            round_robin_cache: config.round_robin_cache,
            stale_cache: config.stale_cache,
            cache_capacity: config.cache_capacity,
            cache_shard_amount: config.cache_shard_amount,
            min_cache_ttl: config.min_cache_ttl,
            max_cache_ttl: config.max_cache_ttl,
        }
    }
}

pub struct DnsClient {
    timeout: Duration,
    disable_cache: bool,
    disable_expire: bool,
    independent_cache: bool,
    round_robin_cache: bool,
    stale_cache: Option<Duration>,
    min_cache_ttl: u32,
    max_cache_ttl: u32,
    cache: Option<LifetimeCache<CacheKey, Arc<CachedMessage>>>,
    refreshing: RefreshSet,
    rejections: Option<Arc<dyn RejectionStore>>,
}

impl DnsClient {
    pub fn new(options: ClientOptions, rejections: Option<Arc<dyn RejectionStore>>) -> Self {
        let max_cache_ttl = match options.max_cache_ttl {
            0 => DEFAULT_MAX_CACHE_TTL,
            ttl => ttl,
        }
        .max(options.min_cache_ttl);
        let timeout = if options.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            options.timeout
        };
        let capacity = options.cache_capacity.max(MIN_CACHE_CAPACITY);

        let cache = (!options.disable_cache)
            .then(|| LifetimeCache::new(capacity, options.cache_shard_amount));

        info!(
            capacity,
            cache_enabled = cache.is_some(),
            independent_cache = options.independent_cache,
            stale_cache = options.stale_cache,
            min_cache_ttl = options.min_cache_ttl,
            max_cache_ttl,
            "Initializing DNS client"
        );

        Self {
            timeout,
            disable_cache: options.disable_cache,
            disable_expire: options.disable_expire,
            independent_cache: options.independent_cache,
            round_robin_cache: options.round_robin_cache,
            stale_cache: (options.stale_cache > 0)
                .then(|| Duration::from_secs(u64::from(options.stale_cache))),
            min_cache_ttl: options.min_cache_ttl,
            max_cache_ttl,
            cache,
            refreshing: RefreshSet::default(),
            rejections,
        }
    }

    /// Exchanges a single query through `transport`.
    ///
    /// Returns `Ok(None)` only for a background refresh that found another
    /// refresh of the same key already running.
    pub async fn exchange(
        &self,
        ctx: &QueryContext,
        transport: &dyn DnsTransport,
        message: &Message,
        options: &QueryOptions,
        checker: Option<ResponseChecker<'_>>,
    ) -> Result<Option<Message>, DomainError> {
        if message.queries().len() != 1 {
            warn!(questions = message.queries().len(), "Bad question size");
            return Ok(Some(format_error_response(message)));
        }
        let query = &message.queries()[0];
        let key = self.cache_key(query, transport.tag());

        let _refresh_guard = if ctx.is_refreshing() {
            match self.refreshing.try_acquire(key.clone()) {
                Some(guard) => Some(guard),
                None => {
                    debug!(question = %format_question(query), "Cache refresh already running");
                    return Ok(None);
                }
            }
        } else {
            None
        };

        let mut request = Cow::Borrowed(message);
        if let Some(subnet) = options.client_subnet {
            set_client_subnet(request.to_mut(), subnet, true);
        }

        let is_simple_request = request.queries().len() == 1
            && request.name_servers().is_empty()
            && request.additionals().is_empty()
            && !has_client_subnet(&request);
        let disable_cache = !is_simple_request || self.disable_cache || options.disable_cache;

        if !disable_cache && !ctx.is_refreshing() {
            if let Some((mut response, ttl)) = self.load_response(&key) {
                debug!(question = %format_question(query), ttl, "Cache HIT");
                response.set_id(message.id());
                return Ok(Some(response));
            }
        }

        if strategy_excludes(options.strategy, query.query_type()) {
            debug!(
                question = %format_question(query),
                strategy = %options.strategy,
                "Query type excluded by strategy"
            );
            return Ok(Some(fixed_response(message.id(), query, &[], 0)));
        }

        if ctx.transport_tag() == Some(transport.tag()) {
            return Err(DomainError::TransportLoopback {
                tag: transport.tag().to_string(),
            });
        }
        let transport_ctx = ctx.with_transport_tag(transport.tag());

        let query_name = query.name().to_ascii();
        if checker.is_some() {
            if let Some(store) = &self.rejections {
                if store.load_rejected(transport.tag(), &query_name, query.query_type()) {
                    return Err(DomainError::ResponseRejectedCached);
                }
            }
        }

        let timeout = transport_ctx.remaining(self.timeout);
        let mut response =
            match tokio::time::timeout(timeout, transport.exchange(&transport_ctx, &request)).await
            {
                Ok(result) => result?,
                Err(_) => return Err(DomainError::QueryTimeout),
            };

        if let Some(checker) = checker {
            let accepted = message_to_addresses(&response)
                .map(|addresses| checker(&addresses))
                .unwrap_or(false);
            if !accepted {
                if let Some(store) = &self.rejections {
                    store.save_rejected_async(transport.tag(), &query_name, query.query_type());
                }
                debug!(
                    question = %format_question(query),
                    transport = transport.tag(),
                    "Response rejected"
                );
                return Err(DomainError::ResponseRejected);
            }
        }

        if query.query_type() == RecordType::HTTPS {
            strip_https_hints(&mut response, options.strategy);
        }

        let ttl = ttl::effective_ttl(
            &response,
            self.min_cache_ttl,
            self.max_cache_ttl,
            options.rewrite_ttl,
        );
        ttl::set_ttl(&mut response, ttl);
        response.set_id(message.id());
        response.set_authoritative(true);

        if !disable_cache {
            self.store(key, response.clone(), ttl);
        }
        debug!(
            question = %format_question(query),
            transport = transport.tag(),
            answers = response.answers().len(),
            ttl,
            "Exchanged"
        );
        Ok(Some(response))
    }

    /// Purges every cached response.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.purge();
        }
    }

    /// Cached response for a query, without contacting any transport.
    ///
    /// The flag asks for a background refresh: the entry is being served stale.
    /// Unavailable when caching is disabled or each transport has its own cache.
    pub fn exchange_cache(&self, message: &Message) -> Option<(Message, bool)> {
        if self.disable_cache || self.independent_cache || message.queries().len() != 1 {
            return None;
        }
        let query = &message.queries()[0];
        let (mut response, ttl) = self.load_response(&CacheKey::from_query(query))?;
        debug!(question = %format_question(query), ttl, "Cache HIT");
        response.set_id(message.id());
        Some((response, self.needs_refresh(ttl)))
    }

    fn cache_key(&self, query: &Query, transport_tag: &str) -> CacheKey {
        let key = CacheKey::from_query(query);
        if self.independent_cache {
            key.with_transport(transport_tag)
        } else {
            key
        }
    }

    #[inline]
    fn needs_refresh(&self, ttl: u32) -> bool {
        self.stale_cache.is_some() && ttl == 0
    }

    fn store(&self, key: CacheKey, message: Message, ttl: u32) {
        if ttl == 0 {
            return;
        }
        let Some(cache) = &self.cache else {
            return;
        };

        if self.disable_expire {
            cache.add(key, Arc::new(CachedMessage::new(message, None)));
            return;
        }

        let lifetime = Duration::from_secs(u64::from(ttl));
        let expire_at = Instant::now() + lifetime;
        let hard_lifetime = lifetime + self.stale_cache.unwrap_or_default();
        cache.add_with_lifetime(
            key,
            Arc::new(CachedMessage::new(message, Some(expire_at))),
            hard_lifetime,
        );
    }

    /// Reads a cached response with aged TTLs, plus the seconds left on it.
    fn load_response(&self, key: &CacheKey) -> Option<(Message, u32)> {
        let cache = self.cache.as_ref()?;

        if self.disable_expire {
            let entry = cache.get(key)?;
            return Some((entry.snapshot(self.round_robin_cache), 0));
        }

        let (entry, lifetime_end) = cache.get_with_lifetime(key)?;
        let now = Instant::now();
        let mut response = entry.snapshot(self.round_robin_cache);

        let expire_at = if self.stale_cache.is_some() {
            let expire_at = entry.expire_at().or(lifetime_end)?;
            if now > expire_at {
                ttl::set_ttl(&mut response, 1);
                return Some((response, 0));
            }
            expire_at
        } else {
            lifetime_end.or(entry.expire_at())?
        };

        let remaining = u32::try_from(expire_at.saturating_duration_since(now).as_secs())
            .unwrap_or(u32::MAX);
        ttl::age_ttl(&mut response, remaining);
        Some((response, remaining))
    }
}

fn strategy_excludes(strategy: DomainStrategy, record_type: RecordType) -> bool {
    matches!(
        (record_type, strategy),
        (RecordType::A, DomainStrategy::Ipv6Only) | (RecordType::AAAA, DomainStrategy::Ipv4Only)
    )
}
