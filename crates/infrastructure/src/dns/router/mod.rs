//! Rule driven DNS router.
//!
//! Answers `exchange` and `lookup` calls: static hosts first, then the shared
//! cache, then rule matching to pick a transport for the client. Answers that
//! fail an address-limited rule send the scan on to the next rule.

mod builder;
mod exchange;
mod hosts;
mod lookup;

pub use builder::RouterBuilder;

use super::client::DnsClient;
use super::reverse_mapping::ReverseMapping;
use super::rule::{MatchedRule, RuleMatcher};
use async_trait::async_trait;
use ferrous_router_application::ports::{DnsRouter, DnsTransportManager, HostsTable};
use ferrous_router_application::{QueryContext, QueryMetadata, QueryOptions};
use ferrous_router_domain::{DomainError, DomainStrategy};
use hickory_proto::op::Message;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

type AddressChecker = Box<dyn Fn(&[IpAddr]) -> bool + Send + Sync>;

pub(crate) struct RouterInner {
    pub(crate) client: DnsClient,
    pub(crate) transports: Arc<dyn DnsTransportManager>,
    pub(crate) matcher: RuleMatcher,
    pub(crate) hosts: Option<Arc<dyn HostsTable>>,
    pub(crate) default_strategy: DomainStrategy,
    pub(crate) reverse_mapping: Option<ReverseMapping>,
}

#[derive(Clone)]
pub struct RuleRouter {
    inner: Arc<RouterInner>,
}

impl RuleRouter {
    pub(crate) fn from_inner(inner: RouterInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn client(&self) -> &DnsClient {
        &self.inner.client
    }

    pub fn default_strategy(&self) -> DomainStrategy {
        self.inner.default_strategy
    }

    fn metadata(&self, ctx: &QueryContext, domain: String) -> QueryMetadata {
        let mut metadata = QueryMetadata::new(domain);
        metadata.inbound = ctx.inbound().map(Arc::from);
        metadata.source = ctx.source();
        metadata
    }

    /// Re-runs an exchange in the background to repopulate a stale entry.
    fn spawn_exchange_refresh(&self, ctx: &QueryContext, message: Message, options: QueryOptions) {
        let router = self.clone();
        let ctx = ctx.for_cache_refresh();
        tokio::spawn(async move {
            if let Err(e) = DnsRouter::exchange(&router, &ctx, &message, options).await {
                debug!(error = %e, "Background cache refresh failed");
            }
        });
    }

    fn spawn_lookup_refresh(&self, ctx: &QueryContext, domain: String, options: QueryOptions) {
        let router = self.clone();
        let ctx = ctx.for_cache_refresh();
        tokio::spawn(async move {
            if let Err(e) = DnsRouter::lookup(&router, &ctx, &domain, options).await {
                debug!(domain = %domain, error = %e, "Background cache refresh failed");
            }
        });
    }
}

/// Response check for a rule that also constrains the answered addresses.
fn address_limit_checker(
    matched: Option<&MatchedRule>,
    metadata: &QueryMetadata,
) -> Option<AddressChecker> {
    let rule = matched.filter(|m| m.rule.with_address_limit())?.rule.clone();
    let metadata = metadata.clone();
    Some(Box::new(move |addresses: &[IpAddr]| {
        let mut metadata = metadata.clone();
        metadata.destination_addresses = addresses.to_vec();
        rule.match_address_limit(&metadata)
    }))
}

fn log_failure(err: &DomainError, domain: &str) {
    match err {
        DomainError::ResponseRejected => debug!(domain = %domain, "Response rejected"),
        DomainError::ResponseRejectedCached => {
            debug!(domain = %domain, "Response rejected (cached)")
        }
        other => error!(domain = %domain, error = %other, "Exchange failed"),
    }
}

#[async_trait]
impl DnsRouter for RuleRouter {
    async fn exchange(
        &self,
        ctx: &QueryContext,
        message: &Message,
        options: QueryOptions,
    ) -> Result<Message, DomainError> {
        self.exchange_message(ctx, message, options).await
    }

    async fn lookup(
        &self,
        ctx: &QueryContext,
        domain: &str,
        options: QueryOptions,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.lookup_domain(ctx, domain, options).await
    }

    fn clear_cache(&self) {
        self.inner.client.clear_cache();
    }

    fn reset_network(&self) {
        self.clear_cache();
        if let Some(mapping) = &self.inner.reverse_mapping {
            mapping.clear();
        }
        for transport in self.inner.transports.transports() {
            transport.reset();
        }
        info!("DNS network state reset");
    }

    fn lookup_reverse_mapping(&self, address: IpAddr) -> Option<String> {
        self.inner
            .reverse_mapping
            .as_ref()
            .and_then(|mapping| mapping.lookup(address))
    }
}
