use super::{address_limit_checker, log_failure, RuleRouter};
use crate::dns::message::fqdn_to_domain;
use crate::dns::rule::MatchOutcome;
use ferrous_router_application::{QueryContext, QueryOptions};
use ferrous_router_domain::{DomainError, RejectMethod};
use std::net::IpAddr;
use tracing::{debug, error, info};

impl RuleRouter {
    pub(super) async fn lookup_domain(
        &self,
        ctx: &QueryContext,
        domain: &str,
        mut options: QueryOptions,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let domain = fqdn_to_domain(domain).to_ascii_lowercase();
        let default_strategy = self.inner.default_strategy;
        let strategy = options.strategy.or(default_strategy);

        let mut target = domain.clone();
        if let Some(hosts) = &self.inner.hosts {
            if let Some(resolution) = hosts.resolve(&domain, strategy) {
                target = resolution.canonical_name(&domain).to_string();
                if let Some(addresses) = resolution.addresses {
                    if !addresses.is_empty() {
                        debug!(domain = %domain, "Answered from hosts");
                        return Ok(addresses);
                    }
                }
            }
        }

        if !ctx.is_refreshing() {
            if let Some((addresses, needs_refresh)) =
                self.inner.client.lookup_cache(&target, strategy)
            {
                if needs_refresh {
                    self.spawn_lookup_refresh(ctx, domain.clone(), options.clone());
                }
                if addresses.is_empty() {
                    return Err(DomainError::NxDomain);
                }
                return Ok(addresses);
            }
        }

        debug!(domain = %target, "Lookup domain");
        let metadata = self.metadata(ctx, target.clone());

        let result = match options.transport.clone() {
            Some(transport) => {
                options.apply_legacy(transport.as_ref());
                options.strategy = options.strategy.or(default_strategy);
                self.inner
                    .client
                    .lookup(ctx, transport.as_ref(), &target, &options, None)
                    .await
            }
            None => {
                let mut cursor = None;
                loop {
                    let mut attempt = options.clone();
                    let outcome = self.inner.matcher.match_next(
                        self.inner.transports.as_ref(),
                        &metadata,
                        false,
                        cursor,
                        true,
                        &mut attempt,
                    );
                    let (transport, matched) = match outcome {
                        MatchOutcome::Reject { method, .. } => {
                            return match method {
                                RejectMethod::Default => Ok(Vec::new()),
                                RejectMethod::Drop => Err(DomainError::Dropped),
                            };
                        }
                        MatchOutcome::Route { transport, matched } => (transport, matched),
                    };
                    attempt.strategy = attempt.strategy.or(default_strategy);

                    let checker = address_limit_checker(matched.as_ref(), &metadata);
                    let result = self
                        .inner
                        .client
                        .lookup(ctx, transport.as_ref(), &target, &attempt, checker.as_deref())
                        .await;

                    if let (Some(_), Err(e)) = (&checker, &result) {
                        if e.is_rejected() {
                            log_failure(e, &target);
                            cursor = matched.map(|m| m.index);
                            continue;
                        }
                    }
                    break result;
                }
            }
        };

        match result {
            Err(e) => {
                log_failure(&e, &target);
                Err(e)
            }
            Ok(addresses) if addresses.is_empty() => {
                error!(domain = %target, "Lookup failed: empty result");
                Err(DomainError::NxDomain)
            }
            Ok(addresses) => {
                info!(domain = %target, addresses = ?addresses, "Lookup succeeded");
                Ok(addresses)
            }
        }
    }
}
