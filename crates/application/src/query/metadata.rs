use hickory_proto::rr::RecordType;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// What a rule gets to see about a query.
#[derive(Debug, Clone, Default)]
pub struct QueryMetadata {
    pub inbound: Option<Arc<str>>,
    pub source: Option<SocketAddr>,
    /// Lowercase domain without the trailing dot.
    pub domain: String,
    pub query_type: Option<RecordType>,
    pub ip_version: Option<u8>,
    /// Addresses of a provisional answer, filled before address-limit checks.
    pub destination_addresses: Vec<IpAddr>,
}

impl QueryMetadata {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn with_query_type(mut self, query_type: RecordType) -> Self {
        self.ip_version = match query_type {
            RecordType::A => Some(4),
            RecordType::AAAA => Some(6),
            _ => None,
        };
        self.query_type = Some(query_type);
        self
    }
}
