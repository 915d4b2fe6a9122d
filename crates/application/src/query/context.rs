use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Per-call request context threaded through the router, the client and transports.
///
/// Carries the inbound that issued the query, whether the call is a background
/// cache refresh, the tag of the transport currently resolving (used to detect
/// a transport resolving through itself) and an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    inbound: Option<Arc<str>>,
    source: Option<SocketAddr>,
    refreshing: bool,
    transport_tag: Option<Arc<str>>,
    deadline: Option<Instant>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inbound(mut self, inbound: impl Into<Arc<str>>) -> Self {
        self.inbound = Some(inbound.into());
        self
    }

    pub fn with_source(mut self, source: SocketAddr) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Context handed to a transport while it serves a query.
    pub fn with_transport_tag(&self, tag: &str) -> Self {
        let mut ctx = self.clone();
        ctx.transport_tag = Some(Arc::from(tag));
        ctx
    }

    /// Context for a fire-and-forget refresh of a stale cache entry.
    pub fn for_cache_refresh(&self) -> Self {
        let mut ctx = self.clone();
        ctx.refreshing = true;
        ctx
    }

    pub fn inbound(&self) -> Option<&str> {
        self.inbound.as_deref()
    }

    pub fn source(&self) -> Option<SocketAddr> {
        self.source
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn transport_tag(&self) -> Option<&str> {
        self.transport_tag.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, bounded by `limit`.
    pub fn remaining(&self, limit: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(limit),
            None => limit,
        }
    }
}
