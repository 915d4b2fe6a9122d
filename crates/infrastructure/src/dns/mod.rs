pub mod cache;
pub mod client;
pub mod hosts;
pub mod message;
pub mod rejection;
pub mod reverse_mapping;
pub mod router;
pub mod rule;
pub mod transport;

pub use cache::{CacheKey, CachedMessage, LifetimeCache};
pub use client::{ClientOptions, DnsClient, ResponseChecker};
pub use hosts::StaticHosts;
pub use rejection::MemoryRejectionStore;
pub use reverse_mapping::ReverseMapping;
pub use router::{RouterBuilder, RuleRouter};
pub use rule::{DefaultDnsRule, MatchOutcome, MatchedRule, RuleMatcher};
pub use transport::TransportRegistry;
