use crate::query::QueryContext;
use async_trait::async_trait;
use ferrous_router_domain::{DomainError, DomainStrategy};
use hickory_proto::op::Message;
use ipnetwork::IpNetwork;
use std::sync::Arc;

/// Transport type reported by transports that hand out synthetic addresses.
pub const FAKE_IP_TRANSPORT_TYPE: &str = "fakeip";

/// Performs the actual wire exchange with an upstream.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    fn tag(&self) -> &str;

    fn transport_type(&self) -> &str;

    fn is_fake_ip(&self) -> bool {
        self.transport_type() == FAKE_IP_TRANSPORT_TYPE
    }

    async fn exchange(&self, ctx: &QueryContext, message: &Message)
        -> Result<Message, DomainError>;

    /// Drop pooled connections after a network change.
    fn reset(&self) {}

    /// Present on transports that carry their own strategy and client subnet.
    fn legacy(&self) -> Option<&dyn LegacyDnsTransport> {
        None
    }
}

pub trait LegacyDnsTransport: Send + Sync {
    fn legacy_strategy(&self) -> DomainStrategy;

    fn legacy_client_subnet(&self) -> Option<IpNetwork>;
}

pub trait DnsTransportManager: Send + Sync {
    fn transport(&self, tag: &str) -> Option<Arc<dyn DnsTransport>>;

    fn default_transport(&self) -> Arc<dyn DnsTransport>;

    fn transports(&self) -> Vec<Arc<dyn DnsTransport>>;
}
