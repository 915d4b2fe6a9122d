mod helpers;

use ferrous_router_application::{QueryContext, QueryOptions};
use ferrous_router_infrastructure::dns::{ClientOptions, DnsClient};
use helpers::{addresses, ip, query, ttls, MockTransport, QUERY_ID};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use std::time::Duration;

async fn exchange(client: &DnsClient, transport: &MockTransport, request: &Message) -> Message {
    exchange_with(client, transport, request, &QueryOptions::default()).await
}

async fn exchange_with(
    client: &DnsClient,
    transport: &MockTransport,
    request: &Message,
    options: &QueryOptions,
) -> Message {
    client
        .exchange(&QueryContext::new(), transport, request, options, None)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_ages_ttl() {
    let transport = MockTransport::answering("remote", &["93.184.216.34"], 300);
    let client = DnsClient::new(ClientOptions::default(), None);
    let request = query("example.com.", RecordType::A);

    let first = exchange(&client, &transport, &request).await;
    assert_eq!(ttls(&first), vec![300]);
    assert!(first.authoritative());

    tokio::time::advance(Duration::from_secs(1)).await;
    let second = exchange(&client, &transport, &request).await;

    assert_eq!(transport.calls(), 1, "second query must be served from cache");
    assert_eq!(ttls(&second), vec![299]);
    assert_eq!(second.id(), QUERY_ID);
    assert_eq!(addresses(&second), vec![ip("93.184.216.34")]);
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_restores_caller_id() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(ClientOptions::default(), None);

    exchange(&client, &transport, &query("example.com.", RecordType::A)).await;

    let mut request = query("example.com.", RecordType::A);
    request.set_id(7);
    let cached = exchange(&client, &transport, &request).await;
    assert_eq!(cached.id(), 7);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_entry_misses_after_expiry() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(ClientOptions::default(), None);
    let request = query("example.com.", RecordType::A);

    exchange(&client, &transport, &request).await;
    tokio::time::advance(Duration::from_secs(301)).await;
    exchange(&client, &transport, &request).await;

    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_entry_served_with_ttl_one_until_grace_ends() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(
        ClientOptions {
            stale_cache: 60,
            ..ClientOptions::default()
        },
        None,
    );
    let request = query("example.com.", RecordType::A);
    exchange(&client, &transport, &request).await;

    tokio::time::advance(Duration::from_secs(305)).await;
    let (stale, needs_refresh) = client.exchange_cache(&request).unwrap();
    assert!(needs_refresh);
    assert_eq!(ttls(&stale), vec![1]);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(client.exchange_cache(&request).is_none());
    exchange(&client, &transport, &request).await;
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_entry_does_not_ask_for_refresh() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(
        ClientOptions {
            stale_cache: 60,
            ..ClientOptions::default()
        },
        None,
    );
    let request = query("example.com.", RecordType::A);
    exchange(&client, &transport, &request).await;

    tokio::time::advance(Duration::from_secs(10)).await;
    let (fresh, needs_refresh) = client.exchange_cache(&request).unwrap();
    assert!(!needs_refresh);
    assert_eq!(ttls(&fresh), vec![290]);
}

#[tokio::test(start_paused = true)]
async fn test_round_robin_rotates_cached_answers() {
    let transport = MockTransport::answering("remote", &["10.0.0.1", "10.0.0.2", "10.0.0.3"], 300);
    let client = DnsClient::new(
        ClientOptions {
            round_robin_cache: true,
            ..ClientOptions::default()
        },
        None,
    );
    let request = query("example.com.", RecordType::A);
    exchange(&client, &transport, &request).await;

    let mut leading = Vec::new();
    for _ in 0..4 {
        let cached = exchange(&client, &transport, &request).await;
        let cached = addresses(&cached);
        assert_eq!(cached.len(), 3);
        leading.push(cached[0]);
    }

    assert_eq!(transport.calls(), 1);
    assert_eq!(
        leading,
        vec![
            ip("10.0.0.1"),
            ip("10.0.0.2"),
            ip("10.0.0.3"),
            ip("10.0.0.1")
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_ttl_is_not_cached() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 0);
    let client = DnsClient::new(ClientOptions::default(), None);
    let request = query("example.com.", RecordType::A);

    exchange(&client, &transport, &request).await;
    exchange(&client, &transport, &request).await;

    assert_eq!(transport.calls(), 2);
    assert!(client.exchange_cache(&request).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_ttl_clamped_to_bounds() {
    let request = query("example.com.", RecordType::A);

    let low = MockTransport::answering("remote", &["1.2.3.4"], 30);
    let client = DnsClient::new(
        ClientOptions {
            min_cache_ttl: 600,
            ..ClientOptions::default()
        },
        None,
    );
    assert_eq!(ttls(&exchange(&client, &low, &request).await), vec![600]);

    let high = MockTransport::answering("remote", &["1.2.3.4"], 7200);
    let client = DnsClient::new(
        ClientOptions {
            max_cache_ttl: 100,
            ..ClientOptions::default()
        },
        None,
    );
    assert_eq!(ttls(&exchange(&client, &high, &request).await), vec![100]);
}

#[tokio::test(start_paused = true)]
async fn test_rewrite_ttl_overrides_bounds() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(
        ClientOptions {
            min_cache_ttl: 600,
            ..ClientOptions::default()
        },
        None,
    );
    let options = QueryOptions {
        rewrite_ttl: Some(42),
        ..QueryOptions::default()
    };

    let response =
        exchange_with(&client, &transport, &query("example.com.", RecordType::A), &options).await;
    assert_eq!(ttls(&response), vec![42]);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_cache_always_exchanges() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(
        ClientOptions {
            disable_cache: true,
            ..ClientOptions::default()
        },
        None,
    );
    let request = query("example.com.", RecordType::A);

    exchange(&client, &transport, &request).await;
    exchange(&client, &transport, &request).await;

    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_independent_cache_is_keyed_by_transport() {
    let first = MockTransport::answering("first", &["1.1.1.1"], 300);
    let second = MockTransport::answering("second", &["2.2.2.2"], 300);
    let client = DnsClient::new(
        ClientOptions {
            independent_cache: true,
            ..ClientOptions::default()
        },
        None,
    );
    let request = query("example.com.", RecordType::A);

    exchange(&client, &first, &request).await;
    let answered = exchange(&client, &second, &request).await;

    assert_eq!(addresses(&answered), vec![ip("2.2.2.2")]);
    assert_eq!(second.calls(), 1);
    assert!(client.exchange_cache(&request).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_clear_cache_forgets_entries() {
    let transport = MockTransport::answering("remote", &["1.2.3.4"], 300);
    let client = DnsClient::new(ClientOptions::default(), None);
    let request = query("example.com.", RecordType::A);

    exchange(&client, &transport, &request).await;
    client.clear_cache();
    exchange(&client, &transport, &request).await;

    assert_eq!(transport.calls(), 2);
}
