#![allow(dead_code)]
use async_trait::async_trait;
use ferrous_router_application::ports::{
    DnsRouter, DnsTransport, LegacyDnsTransport, FAKE_IP_TRANSPORT_TYPE,
};
use ferrous_router_application::{QueryContext, QueryOptions};
use ferrous_router_domain::{DomainError, DomainStrategy};
use ferrous_router_infrastructure::dns::message::message_to_addresses;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

pub const QUERY_ID: u16 = 4242;

type Responder = dyn Fn(&Message) -> Result<Message, DomainError> + Send + Sync;

struct MockLegacy {
    strategy: DomainStrategy,
    client_subnet: Option<IpNetwork>,
}

impl LegacyDnsTransport for MockLegacy {
    fn legacy_strategy(&self) -> DomainStrategy {
        self.strategy
    }

    fn legacy_client_subnet(&self) -> Option<IpNetwork> {
        self.client_subnet
    }
}

/// Transport answering from a closure, counting calls and keeping the last request.
pub struct MockTransport {
    tag: String,
    transport_type: String,
    responder: Box<Responder>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
    last_request: Mutex<Option<Message>>,
    legacy: Option<MockLegacy>,
}

impl MockTransport {
    pub fn with_responder(
        tag: &str,
        responder: impl Fn(&Message) -> Result<Message, DomainError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            transport_type: "udp".to_string(),
            responder: Box::new(responder),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            resets: Arc::new(AtomicUsize::new(0)),
            last_request: Mutex::new(None),
            legacy: None,
        }
    }

    /// Answers A and AAAA questions with the matching addresses from `addresses`.
    pub fn answering(tag: &str, addresses: &[&str], ttl: u32) -> Self {
        let addresses: Vec<IpAddr> = addresses.iter().map(|a| ip(a)).collect();
        Self::with_responder(tag, move |request| Ok(answer(request, &addresses, ttl)))
    }

    pub fn failing(tag: &str, error: DomainError) -> Self {
        Self::with_responder(tag, move |_| Err(error.clone()))
    }

    pub fn fake_ip(mut self) -> Self {
        self.transport_type = FAKE_IP_TRANSPORT_TYPE.to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_legacy(
        mut self,
        strategy: DomainStrategy,
        client_subnet: Option<IpNetwork>,
    ) -> Self {
        self.legacy = Some(MockLegacy {
            strategy,
            client_subnet,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<Message> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsTransport for MockTransport {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn transport_type(&self) -> &str {
        &self.transport_type
    }

    async fn exchange(
        &self,
        _ctx: &QueryContext,
        message: &Message,
    ) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(message.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(message)
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn legacy(&self) -> Option<&dyn LegacyDnsTransport> {
        self.legacy.as_ref().map(|l| l as &dyn LegacyDnsTransport)
    }
}

/// Transport that resolves by calling back into a router.
pub struct RouterTransport<R> {
    tag: String,
    router: OnceLock<R>,
}

impl<R: DnsRouter> RouterTransport<R> {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            router: OnceLock::new(),
        }
    }

    pub fn attach(&self, router: R) {
        let _ = self.router.set(router);
    }
}

#[async_trait]
impl<R: DnsRouter + 'static> DnsTransport for RouterTransport<R> {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn transport_type(&self) -> &str {
        "local"
    }

    async fn exchange(
        &self,
        ctx: &QueryContext,
        message: &Message,
    ) -> Result<Message, DomainError> {
        let router = self
            .router
            .get()
            .ok_or_else(|| DomainError::Transport("router not attached".to_string()))?;
        router.exchange(ctx, message, QueryOptions::default()).await
    }
}

pub fn ip(address: &str) -> IpAddr {
    address.parse().unwrap()
}

pub fn query(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(QUERY_ID)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

/// NOERROR response to `request` with the addresses matching its question type.
pub fn answer(request: &Message, addresses: &[IpAddr], ttl: u32) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .set_response_code(ResponseCode::NoError);

    let Some(question) = request.queries().first() else {
        return response;
    };
    response.add_query(question.clone());
    for address in addresses {
        let rdata = match (address, question.query_type()) {
            (IpAddr::V4(v4), RecordType::A) => RData::A(A(*v4)),
            (IpAddr::V6(v6), RecordType::AAAA) => RData::AAAA(AAAA(*v6)),
            _ => continue,
        };
        response.add_answer(Record::from_rdata(question.name().clone(), ttl, rdata));
    }
    response
}

pub fn with_rcode(request: &Message, code: ResponseCode) -> Message {
    let mut response = answer(request, &[], 0);
    response.set_response_code(code);
    response
}

pub fn addresses(response: &Message) -> Vec<IpAddr> {
    message_to_addresses(response).unwrap()
}

pub fn ttls(response: &Message) -> Vec<u32> {
    response.answers().iter().map(Record::ttl).collect()
}

/// Lets tasks spawned on the current-thread runtime run.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
