use ferrous_router_domain::DomainStrategy;
use std::net::IpAddr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostsResolution {
    /// Alias targets followed from the queried name, in order.
    pub aliases: Vec<String>,
    /// Set when the chain ends in an address entry, ordered by strategy.
    pub addresses: Option<Vec<IpAddr>>,
}

impl HostsResolution {
    /// Name the upstream should be asked for.
    pub fn canonical_name<'a>(&'a self, queried: &'a str) -> &'a str {
        self.aliases.last().map(String::as_str).unwrap_or(queried)
    }
}

pub trait HostsTable: Send + Sync {
    /// `None` when the name has no hosts entry.
    fn resolve(&self, domain: &str, strategy: DomainStrategy) -> Option<HostsResolution>;
}
