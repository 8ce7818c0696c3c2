//! Streaming consumption against a mock HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use birdwire::error::ApiError;
use birdwire::stream::{
    EndpointKind, FilterLevel, FilterStreamOptions, MessageMetadata, StopReason, StreamConfig,
    StreamConsumer,
};
use birdwire::transport::{HttpConfig, HttpExecutor};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Status {
    id: u64,
    text: String,
}

type Received = Arc<Mutex<Vec<(Option<Status>, u64)>>>;

fn consumer(server: &MockServer) -> StreamConsumer<HttpExecutor> {
    let executor = HttpExecutor::new(HttpConfig::new()).unwrap();
    let config = StreamConfig::new()
        .with_public_base_url(format!("{}/1.1", server.uri()))
        .with_user_base_url(format!("{}/user/1.1", server.uri()));
    StreamConsumer::new(Arc::new(executor), config)
}

fn collector() -> (
    Received,
    impl FnMut(Option<Status>, &MessageMetadata) + Send + 'static,
) {
    let received: Received = Arc::default();
    let sink = Arc::clone(&received);
    let handler = move |message: Option<Status>, metadata: &MessageMetadata| {
        sink.lock().unwrap().push((message, metadata.sequence));
    };
    (received, handler)
}

#[tokio::test]
async fn test_public_stream_dispatches_each_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/filter.json"))
        .and(query_param("track", "rust,tokio"))
        .and(query_param("filter_level", "low"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"id\":1,\"text\":\"first\"}\r\n\r\n{\"id\":2,\"text\":\"second\"}\r\n{\"limit\":{\"track\":5}}\r\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (received, handler) = collector();
    let filter = FilterStreamOptions::new()
        .with_track(["rust", "tokio"])
        .with_filter_level(FilterLevel::Low);
    let connection = consumer(&server).open_public_stream(&filter, handler);
    assert_eq!(connection.endpoint(), EndpointKind::Public);

    let summary = connection.join().await.unwrap();
    assert_eq!(summary.reason, StopReason::ServerClosed);
    assert_eq!(summary.messages_dispatched, 2);
    assert_eq!(summary.decode_failures, 1);

    let received = received.lock().unwrap();
    assert_eq!(
        received[0],
        (
            Some(Status {
                id: 1,
                text: "first".into()
            }),
            1
        )
    );
    assert_eq!(received[1].0.as_ref().unwrap().id, 2);
    assert_eq!(received[2], (None, 3));
}

#[tokio::test]
async fn test_user_stream_with_length_framing() {
    let first = "{\"id\":10,\"text\":\"line one\\nline two\"}\r\n";
    let second = "{\"id\":11,\"text\":\"next\"}\r\n";
    let body = format!("{}\r\n{first}\r\n{}\r\n{second}", first.len(), second.len());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/1.1/user.json"))
        .and(query_param("delimited", "length"))
        .and(query_param("with", "followings"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let (received, handler) = collector();
    let filter = FilterStreamOptions::new()
        .with_delimited(true)
        .with_with(birdwire::stream::StreamWith::Followings);
    let summary = consumer(&server)
        .open_user_stream(Some(&filter), handler)
        .join()
        .await
        .unwrap();

    assert_eq!(summary.messages_dispatched, 2);
    let received = received.lock().unwrap();
    assert_eq!(
        received[0].0.as_ref().unwrap().text,
        "line one\nline two"
    );
    assert_eq!(received[1].0.as_ref().unwrap().id, 11);
}

#[tokio::test]
async fn test_rejected_stream_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/filter.json"))
        .respond_with(ResponseTemplate::new(420).set_body_string("Enhance Your Calm"))
        .expect(1)
        .mount(&server)
        .await;

    let executor = HttpExecutor::new(HttpConfig::new()).unwrap();
    let config = StreamConfig::new()
        .with_public_base_url(format!("{}/1.1", server.uri()))
        .with_reconnect(
            birdwire::stream::ReconnectPolicy::new()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_millis(10)),
        );
    let (_received, handler) = collector();
    let err = StreamConsumer::new(Arc::new(executor), config)
        .open_public_stream(&FilterStreamOptions::new(), handler)
        .join()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(420));
    assert!(matches!(err, ApiError::Protocol { .. }));
}

#[tokio::test]
async fn test_cancel_one_connection_while_sibling_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/filter.json"))
        .and(query_param("track", "slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"id\":1,\"text\":\"late\"}\n")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/filter.json"))
        .and(query_param("track", "fast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"id\":2,\"text\":\"a\"}\n{\"id\":3,\"text\":\"b\"}\n"),
        )
        .mount(&server)
        .await;

    let consumer = consumer(&server);
    let (slow_received, slow_handler) = collector();
    let (fast_received, fast_handler) = collector();
    let slow = consumer.open_public_stream(&FilterStreamOptions::new().with_track(["slow"]), slow_handler);
    let fast = consumer.open_public_stream(&FilterStreamOptions::new().with_track(["fast"]), fast_handler);
    assert_ne!(slow.id(), fast.id());

    tokio::time::sleep(Duration::from_millis(100)).await;
    consumer.cancel(&slow);

    let slow_summary = tokio::time::timeout(Duration::from_secs(5), slow.join())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slow_summary.reason, StopReason::Cancelled);
    assert_eq!(slow_summary.messages_dispatched, 0);
    assert!(slow_received.lock().unwrap().is_empty());

    let fast_summary = tokio::time::timeout(Duration::from_secs(5), fast.join())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fast_summary.reason, StopReason::ServerClosed);
    assert_eq!(fast_summary.messages_dispatched, 2);
    assert_eq!(fast_received.lock().unwrap().len(), 2);
}
