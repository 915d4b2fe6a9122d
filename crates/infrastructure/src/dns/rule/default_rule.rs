use aho_corasick::AhoCorasick;
use ferrous_router_application::ports::DnsRule;
use ferrous_router_application::QueryMetadata;
use ferrous_router_domain::{DnsRuleConfig, DomainError, RuleAction};
use hickory_proto::rr::RecordType;
use ipnetwork::IpNetwork;
use rustc_hash::FxHashSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Rule compiled from configuration.
///
/// Domain conditions (exact, suffix, keyword) form one group; query types
/// and inbounds form their own. Non-empty groups must all match. CIDR and
/// private-address conditions make the rule address-limited: they are only
/// checked against the addresses of an answer.
pub struct DefaultDnsRule {
    domains: FxHashSet<String>,
    suffixes: Vec<String>,
    keywords: Option<AhoCorasick>,
    query_types: Vec<RecordType>,
    inbounds: Vec<String>,
    ip_cidr: Vec<IpNetwork>,
    ip_is_private: bool,
    invert: bool,
    action: RuleAction,
    description: String,
}

impl DefaultDnsRule {
    pub fn from_config(config: &DnsRuleConfig) -> Result<Self, DomainError> {
        let normalize = |name: &String| name.trim_matches('.').to_ascii_lowercase();

        let keywords = if config.domain_keyword.is_empty() {
            None
        } else {
            let patterns: Vec<String> = config
                .domain_keyword
                .iter()
                .map(|keyword| keyword.to_ascii_lowercase())
                .collect();
            Some(AhoCorasick::new(&patterns).map_err(|e| {
                DomainError::ConfigError(format!("Invalid domain_keyword: {}", e))
            })?)
        };

        let query_types = config
            .query_type
            .iter()
            .map(|name| {
                RecordType::from_str(&name.to_ascii_uppercase()).map_err(|e| {
                    DomainError::ConfigError(format!("Invalid query_type '{}': {}", name, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            domains: config.domain.iter().map(normalize).collect(),
            suffixes: config.domain_suffix.iter().map(normalize).collect(),
            keywords,
            query_types,
            inbounds: config.inbound.clone(),
            ip_cidr: config.ip_cidr.clone(),
            ip_is_private: config.ip_is_private,
            invert: config.invert,
            action: config.action.clone(),
            description: describe(config),
        })
    }

    fn has_domain_conditions(&self) -> bool {
        !self.domains.is_empty() || !self.suffixes.is_empty() || self.keywords.is_some()
    }

    fn match_domain(&self, domain: &str) -> bool {
        if self.domains.contains(domain) {
            return true;
        }
        if self
            .suffixes
            .iter()
            .any(|suffix| domain == suffix || domain.ends_with(&format!(".{}", suffix)))
        {
            return true;
        }
        self.keywords
            .as_ref()
            .is_some_and(|keywords| keywords.is_match(domain))
    }

    /// Conditions that do not depend on answer addresses.
    fn match_query(&self, metadata: &QueryMetadata) -> bool {
        if self.has_domain_conditions()
            && !self.match_domain(&metadata.domain.to_ascii_lowercase())
        {
            return false;
        }
        if !self.query_types.is_empty()
            && !metadata
                .query_type
                .is_some_and(|query_type| self.query_types.contains(&query_type))
        {
            return false;
        }
        if !self.inbounds.is_empty()
            && !metadata
                .inbound
                .as_deref()
                .is_some_and(|inbound| self.inbounds.iter().any(|i| i == inbound))
        {
            return false;
        }
        true
    }

    fn match_addresses(&self, addresses: &[IpAddr]) -> bool {
        addresses.iter().any(|address| {
            (self.ip_is_private && is_private(address))
                || self.ip_cidr.iter().any(|network| network.contains(*address))
        })
    }
}

impl DnsRule for DefaultDnsRule {
    fn matches(&self, metadata: &QueryMetadata) -> bool {
        if self.with_address_limit() {
            // An inverted rule can still match once the addresses are known.
            return self.invert || self.match_query(metadata);
        }
        self.match_query(metadata) != self.invert
    }

    fn with_address_limit(&self) -> bool {
        !self.ip_cidr.is_empty() || self.ip_is_private
    }

    fn match_address_limit(&self, metadata: &QueryMetadata) -> bool {
        let matched =
            self.match_query(metadata) && self.match_addresses(&metadata.destination_addresses);
        matched != self.invert
    }

    fn action(&self) -> &RuleAction {
        &self.action
    }
}

impl fmt::Display for DefaultDnsRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

fn describe(config: &DnsRuleConfig) -> String {
    let mut parts = Vec::new();
    let mut push = |label: &str, values: &[String]| match values.len() {
        0 => {}
        1 => parts.push(format!("{}={}", label, values[0])),
        _ => parts.push(format!("{}=[{}]", label, values.join(" "))),
    };
    push("domain", &config.domain);
    push("domain_suffix", &config.domain_suffix);
    push("domain_keyword", &config.domain_keyword);
    push("query_type", &config.query_type);
    push("inbound", &config.inbound);
    let cidrs: Vec<String> = config.ip_cidr.iter().map(ToString::to_string).collect();
    push("ip_cidr", &cidrs);
    if config.ip_is_private {
        parts.push("ip_is_private=true".to_string());
    }

    let description = parts.join(" ");
    if config.invert {
        format!("!({})", description)
    } else {
        description
    }
}

fn is_private(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
