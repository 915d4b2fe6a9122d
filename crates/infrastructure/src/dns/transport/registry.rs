use ferrous_router_application::ports::{DnsTransport, DnsTransportManager};
use ferrous_router_domain::DomainError;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::info;

/// Fixed set of transports addressed by tag.
pub struct TransportRegistry {
    transports: Vec<Arc<dyn DnsTransport>>,
    by_tag: FxHashMap<String, usize>,
    default_index: usize,
}

impl TransportRegistry {
    /// The default is `default_tag`, or the first transport when none is given.
    pub fn new(
        transports: Vec<Arc<dyn DnsTransport>>,
        default_tag: Option<&str>,
    ) -> Result<Self, DomainError> {
        if transports.is_empty() {
            return Err(DomainError::ConfigError(
                "At least one DNS transport is required".to_string(),
            ));
        }

        let mut by_tag = FxHashMap::default();
        for (index, transport) in transports.iter().enumerate() {
            if by_tag.insert(transport.tag().to_string(), index).is_some() {
                return Err(DomainError::ConfigError(format!(
                    "Duplicate DNS transport tag: {}",
                    transport.tag()
                )));
            }
        }

        let default_index = match default_tag {
            Some(tag) => *by_tag
                .get(tag)
                .ok_or_else(|| DomainError::TransportNotFound(tag.to_string()))?,
            None => 0,
        };

        info!(
            transports = transports.len(),
            default = transports[default_index].tag(),
            "DNS transports registered"
        );

        Ok(Self {
            transports,
            by_tag,
            default_index,
        })
    }
}

impl DnsTransportManager for TransportRegistry {
    fn transport(&self, tag: &str) -> Option<Arc<dyn DnsTransport>> {
        self.by_tag
            .get(tag)
            .map(|&index| Arc::clone(&self.transports[index]))
    }

    fn default_transport(&self) -> Arc<dyn DnsTransport> {
        Arc::clone(&self.transports[self.default_index])
    }

    fn transports(&self) -> Vec<Arc<dyn DnsTransport>> {
        self.transports.clone()
    }
}
