use super::{RouterInner, RuleRouter};
use crate::dns::client::{ClientOptions, DnsClient};
use crate::dns::hosts::StaticHosts;
use crate::dns::rejection::MemoryRejectionStore;
use crate::dns::reverse_mapping::ReverseMapping;
use crate::dns::rule::{DefaultDnsRule, RuleMatcher};
use crate::dns::transport::TransportRegistry;
use ferrous_router_application::ports::{
    DnsRule, DnsTransport, DnsTransportManager, HostsTable, RejectionStore,
};
use ferrous_router_domain::{DnsConfig, DomainError};
use std::sync::Arc;
use tracing::info;

pub struct RouterBuilder {
    config: DnsConfig,
    transports: Arc<dyn DnsTransportManager>,
    rejections: Option<Arc<dyn RejectionStore>>,
    hosts: Option<Arc<dyn HostsTable>>,
    extra_rules: Vec<Arc<dyn DnsRule>>,
}

impl RouterBuilder {
    pub fn new(config: DnsConfig, transports: Arc<dyn DnsTransportManager>) -> Self {
        Self {
            config,
            transports,
            rejections: None,
            hosts: None,
            extra_rules: Vec::new(),
        }
    }

    /// Registers `transports` with `final_server` (or the first one) as default.
    pub fn from_transports(
        config: DnsConfig,
        transports: Vec<Arc<dyn DnsTransport>>,
    ) -> Result<Self, DomainError> {
        let registry = TransportRegistry::new(transports, config.final_server.as_deref())?;
        Ok(Self::new(config, Arc::new(registry)))
    }

    /// Replaces the in-memory store that `store_rejections` would create.
    pub fn with_rejection_store(mut self, store: Arc<dyn RejectionStore>) -> Self {
        self.rejections = Some(store);
        self
    }

    /// Replaces the table built from the `hosts` config section.
    pub fn with_hosts(mut self, hosts: Arc<dyn HostsTable>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    /// Rules evaluated after the configured ones.
    pub fn with_rules(mut self, rules: Vec<Arc<dyn DnsRule>>) -> Self {
        self.extra_rules.extend(rules);
        self
    }

    pub fn build(self) -> Result<RuleRouter, DomainError> {
        let config = self.config;

        let mut rules: Vec<Arc<dyn DnsRule>> = Vec::with_capacity(config.rules.len());
        for (index, rule) in config.rules.iter().enumerate() {
            let compiled = DefaultDnsRule::from_config(rule).map_err(|e| {
                DomainError::ConfigError(format!("dns rule[{}]: {}", index, e))
            })?;
            rules.push(Arc::new(compiled));
        }
        rules.extend(self.extra_rules);

        let hosts = match self.hosts {
            Some(hosts) => Some(hosts),
            None if config.hosts.is_empty() => None,
            None => Some(Arc::new(StaticHosts::from_config(&config.hosts)?) as Arc<dyn HostsTable>),
        };

        let rejections = self.rejections.or_else(|| {
            config.store_rejections.then(|| {
                Arc::new(MemoryRejectionStore::new(config.rejection_timeout_duration()))
                    as Arc<dyn RejectionStore>
            })
        });

        let reverse_mapping = config
            .reverse_mapping
            .then(|| ReverseMapping::new(config.reverse_mapping_capacity));

        info!(
            rules = rules.len(),
            hosts = hosts.is_some(),
            rejection_store = rejections.is_some(),
            reverse_mapping = reverse_mapping.is_some(),
            strategy = %config.strategy,
            default_transport = %self.transports.default_transport().tag(),
            "Building DNS router"
        );

        Ok(RuleRouter::from_inner(RouterInner {
            client: DnsClient::new(ClientOptions::from(&config), rejections),
            transports: self.transports,
            matcher: RuleMatcher::new(rules),
            hosts,
            default_strategy: config.strategy,
            reverse_mapping,
        }))
    }
}
