use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Response not cached")]
    NotCached,

    #[error("Response rejected")]
    ResponseRejected,

    #[error("Response rejected (cached)")]
    ResponseRejectedCached,

    #[error("DNS query loopback in transport[{tag}]")]
    TransportLoopback { tag: String },

    #[error("Transport not found: {0}")]
    TransportNotFound(String),

    #[error("Query dropped by rule")]
    Dropped,

    #[error("Domain not found (NXDOMAIN)")]
    NxDomain,

    #[error("Upstream returned response code {0}")]
    ResponseCode(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Cache refresh already in flight")]
    RefreshInFlight,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    /// True for the two rejection outcomes that make the router try the next rule.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::ResponseRejected | Self::ResponseRejectedCached)
    }
}
