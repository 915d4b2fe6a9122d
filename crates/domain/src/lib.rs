//! Ferrous DNS Router Domain Layer
pub mod config;
pub mod domain_strategy;
pub mod errors;
pub mod rule_action;

pub use config::{Config, DnsConfig, DnsRuleConfig, LoggingConfig};
pub use domain_strategy::DomainStrategy;
pub use errors::DomainError;
pub use rule_action::{RejectMethod, RouteOverrides, RuleAction};
