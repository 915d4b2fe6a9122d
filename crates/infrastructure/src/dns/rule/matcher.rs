use ferrous_router_application::ports::{DnsRule, DnsTransport, DnsTransportManager};
use ferrous_router_application::{QueryMetadata, QueryOptions};
use ferrous_router_domain::{RejectMethod, RuleAction};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct MatchedRule {
    pub index: usize,
    pub rule: Arc<dyn DnsRule>,
}

pub enum MatchOutcome {
    /// `matched` is `None` when the scan fell through to the default transport.
    Route {
        transport: Arc<dyn DnsTransport>,
        matched: Option<MatchedRule>,
    },
    Reject {
        matched: MatchedRule,
        method: RejectMethod,
    },
}

/// Ordered rule list scanned from a cursor.
pub struct RuleMatcher {
    rules: Vec<Arc<dyn DnsRule>>,
}

impl RuleMatcher {
    pub fn new(rules: Vec<Arc<dyn DnsRule>>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scans the rules after `cursor` (from the start when `None`).
    ///
    /// `route-options` rules update `options` and the scan continues. A
    /// `route` whose transport is unknown, or is fake-IP while fake-IP is not
    /// allowed, is skipped.
    pub fn match_next(
        &self,
        transports: &dyn DnsTransportManager,
        metadata: &QueryMetadata,
        allow_fake_ip: bool,
        cursor: Option<usize>,
        is_address_query: bool,
        options: &mut QueryOptions,
    ) -> MatchOutcome {
        let start = cursor.map_or(0, |index| index + 1);

        for (index, rule) in self.rules.iter().enumerate().skip(start) {
            if rule.with_address_limit() && !is_address_query {
                continue;
            }
            if !rule.matches(metadata) {
                continue;
            }
            debug!(
                domain = %metadata.domain,
                rule = index,
                description = %rule,
                action = %rule.action(),
                "DNS rule matched"
            );

            match rule.action() {
                RuleAction::Route { server, overrides } => {
                    let Some(transport) = transports.transport(server) else {
                        error!(server = %server, "Transport not found");
                        continue;
                    };
                    let is_fake_ip = transport.is_fake_ip();
                    if is_fake_ip && !allow_fake_ip {
                        continue;
                    }
                    options.apply_overrides(overrides);
                    if is_fake_ip {
                        options.disable_cache = true;
                    }
                    options.apply_legacy(transport.as_ref());
                    return MatchOutcome::Route {
                        transport,
                        matched: Some(MatchedRule {
                            index,
                            rule: Arc::clone(rule),
                        }),
                    };
                }
                RuleAction::RouteOptions { overrides } => {
                    options.apply_overrides(overrides);
                }
                RuleAction::Reject { method } => {
                    return MatchOutcome::Reject {
                        matched: MatchedRule {
                            index,
                            rule: Arc::clone(rule),
                        },
                        method: *method,
                    };
                }
            }
        }

        MatchOutcome::Route {
            transport: transports.default_transport(),
            matched: None,
        }
    }
}
