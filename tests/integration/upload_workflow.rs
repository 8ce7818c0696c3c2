//! Chunked upload against a mock HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use birdwire::error::{ApiError, UploadPhase};
use birdwire::traits::PollTimer;
use birdwire::transport::{HttpConfig, HttpExecutor};
use birdwire::upload::{
    BlockingUploadCoordinator, ChunkedUploadCoordinator, MediaCategory, ProcessingOutcome,
    ProcessingState, UploadConfig,
};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPLOAD_PATH: &str = "/1.1/media/upload.json";

/// Timer that never waits.
#[derive(Debug, Default)]
struct NoWait;

#[async_trait]
impl PollTimer for NoWait {
    async fn sleep(&self, _duration: Duration) {}
}

fn coordinator(
    server: &MockServer,
    chunk_size: usize,
) -> ChunkedUploadCoordinator<HttpExecutor, NoWait> {
    let executor = HttpExecutor::new(HttpConfig::new().with_access_token("test-token")).unwrap();
    let config = UploadConfig::new()
        .with_base_url(format!("{}/1.1", server.uri()))
        .with_chunk_size(chunk_size);
    ChunkedUploadCoordinator::new(Arc::new(executor), config).with_timer(NoWait)
}

async fn mount_init(server: &MockServer, media_id: &str) {
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("command=INIT"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("x-rate-limit-limit", "615")
                .insert_header("x-rate-limit-remaining", "614")
                .insert_header("x-rate-limit-reset", "1700000000")
                .set_body_json(json!({
                    "media_id_string": media_id,
                    "expires_after_secs": 86_400
                })),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_append(server: &MockServer, segment: u32) {
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("APPEND"))
        .and(body_string_contains(format!(
            "name=\"segment_index\"\r\n\r\n{segment}\r\n"
        )))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_finalize(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("command=FINALIZE"))
        .respond_with(ResponseTemplate::new(201).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_video_upload_with_processing() {
    let server = MockServer::start().await;
    mount_init(&server, "710511363345354753").await;
    for segment in 0..3 {
        mount_append(&server, segment).await;
    }
    mount_finalize(
        &server,
        json!({
            "media_id_string": "710511363345354753",
            "processing_info": {"state": "pending", "check_after_secs": 1}
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(UPLOAD_PATH))
        .and(query_param("command", "STATUS"))
        .and(query_param("media_id", "710511363345354753"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processing_info": {"state": "in_progress", "check_after_secs": 2, "progress_percent": 60}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(UPLOAD_PATH))
        .and(query_param("command", "STATUS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processing_info": {"state": "succeeded", "progress_percent": 100}
        })))
        .mount(&server)
        .await;

    let session = coordinator(&server, 4)
        .upload(
            "video/mp4",
            MediaCategory::Video,
            false,
            Bytes::from_static(b"0123456789"),
        )
        .await
        .unwrap();

    assert_eq!(session.media_id(), "710511363345354753");
    assert_eq!(session.bytes_sent(), 10);
    assert_eq!(session.next_segment_index(), 3);
    assert!(session.is_complete());
    assert_eq!(
        session.processing().and_then(ProcessingOutcome::state),
        Some(ProcessingState::Succeeded)
    );
    assert_eq!(session.expires_after_secs(), Some(86_400));
}

#[tokio::test]
async fn test_init_fields_and_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("command=INIT"))
        .and(body_string_contains("total_bytes=3"))
        .and(body_string_contains("media_type=image%2Fpng"))
        .and(body_string_contains("media_category=tweet_image"))
        .and(body_string_contains("shared=true"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-rate-limit-limit", "615")
                .insert_header("x-rate-limit-remaining", "614")
                .insert_header("x-rate-limit-reset", "1700000000")
                .set_body_json(json!({"media_id": 99, "media_id_string": "99"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = coordinator(&server, 4)
        .initialize("image/png", 3, MediaCategory::Image, true)
        .await
        .unwrap();

    assert_eq!(session.media_id(), "99");
    assert!(session.shared());
    let rate_limit = session.rate_limit().unwrap();
    assert_eq!(rate_limit.limit, 615);
    assert_eq!(rate_limit.remaining, 614);
    assert_eq!(rate_limit.reset_at.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_image_completes_without_processing() {
    let server = MockServer::start().await;
    mount_init(&server, "42").await;
    mount_append(&server, 0).await;
    mount_finalize(&server, json!({"media_id_string": "42", "size": 3})).await;

    let session = coordinator(&server, 4)
        .upload("image/png", MediaCategory::Image, false, Bytes::from_static(b"png"))
        .await
        .unwrap();

    assert_eq!(session.processing(), Some(&ProcessingOutcome::Immediate));
    assert!(session.is_complete());
}

#[tokio::test]
async fn test_rejected_init_reports_phase_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{"code": 324, "message": "Invalid media type"}]
        })))
        .mount(&server)
        .await;

    let err = coordinator(&server, 4)
        .upload("text/plain", MediaCategory::Image, false, Bytes::from_static(b"txt"))
        .await
        .unwrap_err();

    assert_eq!(err.phase, UploadPhase::Init);
    assert_eq!(
        err.source,
        ApiError::Protocol {
            status: 400,
            message: "324: Invalid media type".into()
        }
    );
}

#[tokio::test]
async fn test_failed_processing_is_surfaced() {
    let server = MockServer::start().await;
    mount_init(&server, "7").await;
    mount_append(&server, 0).await;
    mount_finalize(
        &server,
        json!({
            "media_id_string": "7",
            "processing_info": {"state": "pending", "check_after_secs": 1}
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(UPLOAD_PATH))
        .and(query_param("command", "STATUS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processing_info": {
                "state": "failed",
                "error": {"code": 1, "name": "InvalidMedia", "message": "Unsupported video format"}
            }
        })))
        .mount(&server)
        .await;

    let err = coordinator(&server, 4)
        .upload("video/mp4", MediaCategory::Video, false, Bytes::from_static(b"mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.phase, UploadPhase::Status);
    assert_eq!(
        err.source,
        ApiError::MediaProcessing {
            code: 1,
            name: "InvalidMedia".into(),
            message: "Unsupported video format".into()
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let executor = HttpExecutor::new(HttpConfig::new().with_connect_timeout_ms(500)).unwrap();
    let coordinator = ChunkedUploadCoordinator::new(
        Arc::new(executor),
        UploadConfig::new().with_base_url("http://127.0.0.1:1/1.1"),
    );

    let err = coordinator
        .initialize("image/png", 3, MediaCategory::Image, false)
        .await
        .unwrap_err();
    assert_eq!(err.phase, UploadPhase::Init);
    assert!(err.is_transport());
}

#[test]
fn test_blocking_upload_over_http() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_init(&server, "55").await;
        mount_append(&server, 0).await;
        mount_append(&server, 1).await;
        mount_finalize(&server, json!({"media_id_string": "55"})).await;
        server
    });

    let executor = HttpExecutor::new(HttpConfig::new().with_access_token("test-token")).unwrap();
    let inner = ChunkedUploadCoordinator::new(
        Arc::new(executor),
        UploadConfig::new()
            .with_base_url(format!("{}/1.1", server.uri()))
            .with_chunk_size(4),
    );
    let coordinator = BlockingUploadCoordinator::new(inner).unwrap();

    let session = coordinator
        .upload("image/gif", MediaCategory::AnimatedGif, false, Bytes::from_static(b"GIF89a"))
        .unwrap();
    assert_eq!(session.bytes_sent(), 6);
    assert!(session.is_complete());

    drop(server);
}
