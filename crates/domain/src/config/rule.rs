use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::rule_action::RuleAction;

/// One routing rule. Non-empty condition groups are ANDed; entries inside a group are ORed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsRuleConfig {
    #[serde(default)]
    pub domain: Vec<String>,

    #[serde(default)]
    pub domain_suffix: Vec<String>,

    #[serde(default)]
    pub domain_keyword: Vec<String>,

    /// Record type names such as `A`, `AAAA` or `HTTPS`.
    #[serde(default)]
    pub query_type: Vec<String>,

    #[serde(default)]
    pub inbound: Vec<String>,

    /// Matched against the addresses of a provisional answer.
    #[serde(default)]
    pub ip_cidr: Vec<IpNetwork>,

    #[serde(default)]
    pub ip_is_private: bool,

    #[serde(default)]
    pub invert: bool,

    #[serde(flatten)]
    pub action: RuleAction,
}

impl DnsRuleConfig {
    pub fn new(action: RuleAction) -> Self {
        Self {
            domain: Vec::new(),
            domain_suffix: Vec::new(),
            domain_keyword: Vec::new(),
            query_type: Vec::new(),
            inbound: Vec::new(),
            ip_cidr: Vec::new(),
            ip_is_private: false,
            invert: false,
            action,
        }
    }

    pub fn has_address_limit(&self) -> bool {
        !self.ip_cidr.is_empty() || self.ip_is_private
    }

    pub fn validate(&self) -> Result<(), String> {
        if let RuleAction::Route { server, .. } = &self.action {
            if server.is_empty() {
                return Err("route action requires a server".to_string());
            }
        }
        for name in self.domain.iter().chain(&self.domain_suffix) {
            if name.is_empty() {
                return Err("empty domain condition".to_string());
            }
        }
        Ok(())
    }
}
