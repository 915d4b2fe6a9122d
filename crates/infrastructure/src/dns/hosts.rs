use super::message::fqdn_to_domain;
use ferrous_router_application::ports::{HostsResolution, HostsTable};
use ferrous_router_domain::{DomainError, DomainStrategy};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::net::IpAddr;

const MAX_ALIAS_DEPTH: usize = 8;

#[derive(Debug, Clone)]
enum HostsValue {
    Addresses(Vec<IpAddr>),
    Alias(String),
}

/// Hosts table loaded from configuration.
#[derive(Debug, Default)]
pub struct StaticHosts {
    entries: FxHashMap<String, HostsValue>,
}

impl StaticHosts {
    /// Each entry is either a list of addresses or a single name to alias to.
    pub fn from_config(hosts: &BTreeMap<String, Vec<String>>) -> Result<Self, DomainError> {
        let mut entries = FxHashMap::default();
        for (domain, values) in hosts {
            let addresses: Result<Vec<IpAddr>, _> = values.iter().map(|v| v.parse()).collect();
            let value = match (addresses, values.as_slice()) {
                (Ok(addresses), _) if !addresses.is_empty() => HostsValue::Addresses(addresses),
                (Err(_), [alias]) => HostsValue::Alias(normalize(alias)),
                _ => {
                    return Err(DomainError::ConfigError(format!(
                        "hosts entry '{}' must be a list of addresses or a single alias",
                        domain
                    )))
                }
            };
            entries.insert(normalize(domain), value);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HostsTable for StaticHosts {
    fn resolve(&self, domain: &str, strategy: DomainStrategy) -> Option<HostsResolution> {
        let mut current = normalize(domain);
        let mut resolution = HostsResolution::default();

        for _ in 0..MAX_ALIAS_DEPTH {
            match self.entries.get(&current) {
                Some(HostsValue::Addresses(addresses)) => {
                    resolution.addresses = Some(filter_addresses(addresses, strategy));
                    break;
                }
                Some(HostsValue::Alias(target)) => {
                    if target == &normalize(domain) || resolution.aliases.contains(target) {
                        break;
                    }
                    resolution.aliases.push(target.clone());
                    current = target.clone();
                }
                None => break,
            }
        }

        if resolution.aliases.is_empty() && resolution.addresses.is_none() {
            return None;
        }
        Some(resolution)
    }
}

fn normalize(name: &str) -> String {
    fqdn_to_domain(name).to_ascii_lowercase()
}

fn filter_addresses(addresses: &[IpAddr], strategy: DomainStrategy) -> Vec<IpAddr> {
    let (ipv4, ipv6): (Vec<IpAddr>, Vec<IpAddr>) =
        addresses.iter().partition(|address| address.is_ipv4());
    match strategy {
        DomainStrategy::Ipv4Only => ipv4,
        DomainStrategy::Ipv6Only => ipv6,
        _ => super::message::sort_addresses(ipv4, ipv6, strategy),
    }
}
