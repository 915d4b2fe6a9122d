use super::hosts::{alias_records, hosts_response, restore_alias, rewrite_query};
use super::{address_limit_checker, log_failure, RuleRouter};
use crate::dns::message::{
    fixed_response, format_error_response, format_question, fqdn_to_domain, is_address_query,
};
use crate::dns::rule::MatchOutcome;
use ferrous_router_application::{QueryContext, QueryOptions};
use ferrous_router_domain::{DomainError, RejectMethod};
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, Record, RecordType};
use std::borrow::Cow;
use std::net::IpAddr;
use tracing::{debug, warn};

impl RuleRouter {
    pub(super) async fn exchange_message(
        &self,
        ctx: &QueryContext,
        message: &Message,
        mut options: QueryOptions,
    ) -> Result<Message, DomainError> {
        if message.queries().len() != 1 {
            warn!(questions = message.queries().len(), "Bad question size");
            return Ok(format_error_response(message));
        }
        let query = &message.queries()[0];
        debug!(question = %format_question(query), "Exchange");

        let default_strategy = self.inner.default_strategy;
        let strategy = options.strategy.or(default_strategy);

        let mut request = Cow::Borrowed(message);
        let mut aliases: Vec<Record> = Vec::new();
        if let Some(hosts) = &self.inner.hosts {
            let queried = query.name().to_ascii();
            let domain = fqdn_to_domain(&queried).to_ascii_lowercase();
            if let Some(resolution) = hosts.resolve(&domain, strategy) {
                aliases = alias_records(query, &resolution.aliases)?;
                if let Some(addresses) = &resolution.addresses {
                    if matches!(query.query_type(), RecordType::A | RecordType::AAAA) {
                        debug!(domain = %domain, "Answered from hosts");
                        return Ok(hosts_response(message, query, &aliases, addresses));
                    }
                }
                if !resolution.aliases.is_empty() {
                    let canonical = resolution.canonical_name(&domain);
                    request = Cow::Owned(rewrite_query(message, query, canonical)?);
                }
            }
        }
        let question = request.queries()[0].clone();

        if !ctx.is_refreshing() {
            if let Some((mut response, needs_refresh)) =
                self.inner.client.exchange_cache(&request)
            {
                if needs_refresh {
                    self.spawn_exchange_refresh(ctx, message.clone(), options.clone());
                }
                restore_alias(&mut response, query, &aliases);
                return Ok(response);
            }
        }

        let target = fqdn_to_domain(&question.name().to_ascii()).to_ascii_lowercase();
        let metadata = self
            .metadata(ctx, target.clone())
            .with_query_type(question.query_type());

        let (transport, result) = match options.transport.clone() {
            Some(transport) => {
                options.apply_legacy(transport.as_ref());
                options.strategy = options.strategy.or(default_strategy);
                let result = self
                    .inner
                    .client
                    .exchange(ctx, transport.as_ref(), &request, &options, None)
                    .await;
                (transport, result)
            }
            None => {
                let address_query = is_address_query(&request);
                let mut cursor = None;
                loop {
                    let mut attempt = options.clone();
                    let outcome = self.inner.matcher.match_next(
                        self.inner.transports.as_ref(),
                        &metadata,
                        true,
                        cursor,
                        address_query,
                        &mut attempt,
                    );
                    let (transport, matched) = match outcome {
                        MatchOutcome::Reject { method, .. } => {
                            return reject_exchange(message.id(), query, method);
                        }
                        MatchOutcome::Route { transport, matched } => (transport, matched),
                    };
                    attempt.strategy = attempt.strategy.or(default_strategy);

                    let checker = address_limit_checker(matched.as_ref(), &metadata);
                    let result = self
                        .inner
                        .client
                        .exchange(ctx, transport.as_ref(), &request, &attempt, checker.as_deref())
                        .await;

                    if let (Some(_), Err(e)) = (&checker, &result) {
                        if e.is_rejected() {
                            log_failure(e, &target);
                            cursor = matched.map(|m| m.index);
                            continue;
                        }
                    }
                    break (transport, result);
                }
            }
        };

        let mut response = match result {
            Ok(Some(response)) => response,
            Ok(None) => return Err(DomainError::RefreshInFlight),
            Err(e) => {
                log_failure(&e, &target);
                return Err(e);
            }
        };

        if let Some(mapping) = &self.inner.reverse_mapping {
            if !transport.is_fake_ip() {
                for record in response.answers() {
                    let address = match record.data() {
                        RData::A(A(v4)) => IpAddr::V4(*v4),
                        RData::AAAA(AAAA(v6)) => IpAddr::V6(*v6),
                        _ => continue,
                    };
                    let owner = record.name().to_lowercase().to_ascii();
                    mapping.record(address, fqdn_to_domain(&owner), record.ttl());
                }
            }
        }

        restore_alias(&mut response, query, &aliases);
        Ok(response)
    }
}

fn reject_exchange(id: u16, query: &Query, method: RejectMethod) -> Result<Message, DomainError> {
    match method {
        RejectMethod::Default => Ok(fixed_response(id, query, &[], 0)),
        RejectMethod::Drop => Err(DomainError::Dropped),
    }
}
