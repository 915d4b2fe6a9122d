use crate::query::QueryMetadata;
use ferrous_router_domain::RuleAction;
use std::fmt;

/// A pre-compiled routing rule. `Display` gives the description used in logs.
pub trait DnsRule: Send + Sync + fmt::Display {
    fn matches(&self, metadata: &QueryMetadata) -> bool;

    /// Whether the final decision depends on the addresses of the answer.
    fn with_address_limit(&self) -> bool;

    /// Evaluated against `metadata.destination_addresses` of a provisional answer.
    fn match_address_limit(&self, metadata: &QueryMetadata) -> bool;

    fn action(&self) -> &RuleAction;
}
