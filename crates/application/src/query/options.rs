use crate::ports::DnsTransport;
use ferrous_router_domain::{DomainStrategy, RouteOverrides};
use ipnetwork::IpNetwork;
use std::fmt;
use std::sync::Arc;

/// Per-call overrides. Rules may fill what the caller left unset.
#[derive(Clone, Default)]
pub struct QueryOptions {
    /// Pins the transport and skips rule matching.
    pub transport: Option<Arc<dyn DnsTransport>>,
    pub strategy: DomainStrategy,
    pub disable_cache: bool,
    pub rewrite_ttl: Option<u32>,
    pub client_subnet: Option<IpNetwork>,
}

impl QueryOptions {
    pub fn with_strategy(strategy: DomainStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_transport(transport: Arc<dyn DnsTransport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }

    /// Strategy and client subnet only fill unset fields; the cache flag is
    /// ORed and a TTL rewrite replaces the current one.
    pub fn apply_overrides(&mut self, overrides: &RouteOverrides) {
        if self.strategy.is_as_is() {
            self.strategy = overrides.strategy;
        }
        if overrides.disable_cache {
            self.disable_cache = true;
        }
        if overrides.rewrite_ttl.is_some() {
            self.rewrite_ttl = overrides.rewrite_ttl;
        }
        if self.client_subnet.is_none() {
            self.client_subnet = overrides.client_subnet;
        }
    }

    /// Fallbacks exposed by a transport that predates per-call options.
    pub fn apply_legacy(&mut self, transport: &dyn DnsTransport) {
        if let Some(legacy) = transport.legacy() {
            if self.strategy.is_as_is() {
                self.strategy = legacy.legacy_strategy();
            }
            if self.client_subnet.is_none() {
                self.client_subnet = legacy.legacy_client_subnet();
            }
        }
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("transport", &self.transport.as_ref().map(|t| t.tag().to_string()))
            .field("strategy", &self.strategy)
            .field("disable_cache", &self.disable_cache)
            .field("rewrite_ttl", &self.rewrite_ttl)
            .field("client_subnet", &self.client_subnet)
            .finish()
    }
}
