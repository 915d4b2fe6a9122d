mod dns_router;
mod dns_rule;
mod dns_transport;
mod hosts_table;
mod rejection_store;

pub use dns_router::DnsRouter;
pub use dns_rule::DnsRule;
pub use dns_transport::{
    DnsTransport, DnsTransportManager, LegacyDnsTransport, FAKE_IP_TRANSPORT_TYPE,
};
pub use hosts_table::{HostsResolution, HostsTable};
pub use rejection_store::RejectionStore;
