use super::super::cache::CacheKey;
use super::super::message::{fqdn_to_domain, message_to_addresses, sort_addresses};
use super::{DnsClient, ResponseChecker};
use ferrous_router_application::ports::DnsTransport;
use ferrous_router_application::{QueryContext, QueryOptions};
use ferrous_router_domain::{DomainError, DomainStrategy};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use std::net::IpAddr;

impl DnsClient {
    /// Resolves `domain` to addresses.
    ///
    /// `*_only` strategies issue one query. Otherwise A and AAAA run
    /// concurrently; an error is only returned when neither produced an address.
    pub async fn lookup(
        &self,
        ctx: &QueryContext,
        transport: &dyn DnsTransport,
        domain: &str,
        options: &QueryOptions,
        checker: Option<ResponseChecker<'_>>,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let name = fqdn_name(domain)?;
        match options.strategy {
            DomainStrategy::Ipv4Only => {
                self.lookup_to_exchange(ctx, transport, &name, RecordType::A, options, checker)
                    .await
            }
            DomainStrategy::Ipv6Only => {
                self.lookup_to_exchange(ctx, transport, &name, RecordType::AAAA, options, checker)
                    .await
            }
            strategy => {
                let (ipv4, ipv6) = tokio::join!(
                    self.lookup_to_exchange(ctx, transport, &name, RecordType::A, options, checker),
                    self.lookup_to_exchange(
                        ctx,
                        transport,
                        &name,
                        RecordType::AAAA,
                        options,
                        checker,
                    ),
                );
                let error = ipv4.as_ref().err().or(ipv6.as_ref().err()).cloned();
                let ipv4 = ipv4.unwrap_or_default();
                let ipv6 = ipv6.unwrap_or_default();
                if ipv4.is_empty() && ipv6.is_empty() {
                    if let Some(error) = error {
                        return Err(error);
                    }
                }
                Ok(sort_addresses(ipv4, ipv6, strategy))
            }
        }
    }

    /// Cached addresses for `domain`, and whether they are being served stale.
    ///
    /// Unavailable when caching is disabled or each transport has its own cache.
    pub fn lookup_cache(
        &self,
        domain: &str,
        strategy: DomainStrategy,
    ) -> Option<(Vec<IpAddr>, bool)> {
        if self.disable_cache || self.independent_cache {
            return None;
        }
        let domain = fqdn_to_domain(domain);
        let key = |record_type| CacheKey::new(domain, record_type, DNSClass::IN);

        match strategy {
            DomainStrategy::Ipv4Only => self.single_question_cache(&key(RecordType::A)),
            DomainStrategy::Ipv6Only => self.single_question_cache(&key(RecordType::AAAA)),
            _ => {
                let (ipv4, ttl4) = self.question_cache(&key(RecordType::A)).unwrap_or_default();
                let (ipv6, ttl6) = self
                    .question_cache(&key(RecordType::AAAA))
                    .unwrap_or_default();
                if ipv4.is_empty() && ipv6.is_empty() {
                    return None;
                }
                let ttl = ttl4.max(ttl6);
                Some((sort_addresses(ipv4, ipv6, strategy), self.needs_refresh(ttl)))
            }
        }
    }

    async fn lookup_to_exchange(
        &self,
        ctx: &QueryContext,
        transport: &dyn DnsTransport,
        name: &Name,
        record_type: RecordType,
        options: &QueryOptions,
        checker: Option<ResponseChecker<'_>>,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let query = Query::query(name.clone(), record_type);
        let disable_cache = self.disable_cache || options.disable_cache;
        if !disable_cache && !ctx.is_refreshing() {
            match self.question_cache(&self.cache_key(&query, transport.tag())) {
                Err(DomainError::NotCached) => {}
                cached => return cached.map(|(addresses, _)| addresses),
            }
        }

        let mut message = Message::new();
        message
            .set_id(fastrand::u16(..))
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        message.add_query(query);

        match self.exchange(ctx, transport, &message, options, checker).await? {
            Some(response) => message_to_addresses(&response),
            None => Ok(Vec::new()),
        }
    }

    fn question_cache(&self, key: &CacheKey) -> Result<(Vec<IpAddr>, u32), DomainError> {
        let (response, ttl) = self.load_response(key).ok_or(DomainError::NotCached)?;
        message_to_addresses(&response).map(|addresses| (addresses, ttl))
    }

    fn single_question_cache(&self, key: &CacheKey) -> Option<(Vec<IpAddr>, bool)> {
        match self.question_cache(key) {
            Ok((addresses, ttl)) => Some((addresses, self.needs_refresh(ttl))),
            Err(DomainError::NotCached) => None,
            Err(_) => Some((Vec::new(), false)),
        }
    }
}

fn fqdn_name(domain: &str) -> Result<Name, DomainError> {
    let domain = fqdn_to_domain(domain);
    Name::from_ascii(format!("{}.", domain))
        .map_err(|e| DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e)))
}
