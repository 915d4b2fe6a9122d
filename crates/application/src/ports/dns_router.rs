use crate::query::{QueryContext, QueryOptions};
use async_trait::async_trait;
use ferrous_router_domain::DomainError;
use hickory_proto::op::Message;
use std::net::IpAddr;

#[async_trait]
pub trait DnsRouter: Send + Sync {
    /// Answers a parsed query. Malformed queries yield a FORMERR response, not an error.
    async fn exchange(
        &self,
        ctx: &QueryContext,
        message: &Message,
        options: QueryOptions,
    ) -> Result<Message, DomainError>;

    async fn lookup(
        &self,
        ctx: &QueryContext,
        domain: &str,
        options: QueryOptions,
    ) -> Result<Vec<IpAddr>, DomainError>;

    fn clear_cache(&self);

    /// Clears the cache and resets every transport.
    fn reset_network(&self);

    fn lookup_reverse_mapping(&self, address: IpAddr) -> Option<String>;
}
