use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::rule::DnsRuleConfig;
use crate::domain_strategy::DomainStrategy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Strategy substituted for queries that do not resolve one themselves.
    #[serde(default)]
    pub strategy: DomainStrategy,

    /// Transport used when no rule matches. Defaults to the first transport.
    #[serde(default)]
    pub final_server: Option<String>,

    /// Upstream exchange timeout in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    #[serde(default)]
    pub disable_cache: bool,

    #[serde(default)]
    pub disable_expire: bool,

    /// Keep a separate cache keyspace per transport.
    #[serde(default)]
    pub independent_cache: bool,

    #[serde(default)]
    pub round_robin_cache: bool,

    /// Seconds an expired entry may still be served while it is refreshed. 0 disables.
    #[serde(default)]
    pub stale_cache: u32,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_cache_shard_amount")]
    pub cache_shard_amount: usize,

    #[serde(default)]
    pub min_cache_ttl: u32,

    #[serde(default = "default_max_cache_ttl")]
    pub max_cache_ttl: u32,

    #[serde(default)]
    pub reverse_mapping: bool,

    #[serde(default = "default_reverse_mapping_capacity")]
    pub reverse_mapping_capacity: usize,

    /// Remember transports whose answers were rejected by an address-limited rule.
    #[serde(default)]
    pub store_rejections: bool,

    /// Seconds a remembered rejection stays valid.
    #[serde(default = "default_rejection_timeout")]
    pub rejection_timeout: u64,

    /// Static hosts: a list of addresses, or a single name to alias.
    #[serde(default)]
    pub hosts: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub rules: Vec<DnsRuleConfig>,
}

impl DnsConfig {
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.query_timeout)
    }

    pub fn rejection_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.rejection_timeout)
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            strategy: DomainStrategy::AsIs,
            final_server: None,
            query_timeout: default_query_timeout(),
            disable_cache: false,
            disable_expire: false,
            independent_cache: false,
            round_robin_cache: false,
            stale_cache: 0,
            cache_capacity: default_cache_capacity(),
            cache_shard_amount: default_cache_shard_amount(),
            min_cache_ttl: 0,
            max_cache_ttl: default_max_cache_ttl(),
            reverse_mapping: false,
            reverse_mapping_capacity: default_reverse_mapping_capacity(),
            store_rejections: false,
            rejection_timeout: default_rejection_timeout(),
            hosts: BTreeMap::new(),
            rules: Vec::new(),
        }
    }
}

fn default_query_timeout() -> u64 {
    10_000
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_cache_shard_amount() -> usize {
    16
}

fn default_max_cache_ttl() -> u32 {
    86_400
}

fn default_reverse_mapping_capacity() -> usize {
    1024
}

fn default_rejection_timeout() -> u64 {
    7 * 24 * 60 * 60
}
