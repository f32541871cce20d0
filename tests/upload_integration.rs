//! Integration tests for multipart uploads against a mock HTTP server.

mod support;

use media_transfer::transfer::{
    AuthToken, EngineConfig, ErrorKind, NamedBlob, TransferEngine, TransferOutcome,
    TransferRequest, UploadReceipt,
};
use serde_json::json;
use support::RecordingNotifier;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn small_chunk_engine() -> TransferEngine {
    let config = EngineConfig {
        upload_chunk_size: 4 * 1024,
        ..EngineConfig::default()
    };
    TransferEngine::new(config).expect("engine should build")
}

#[tokio::test]
async fn test_upload_posts_multipart_and_returns_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(query_param("path", "holiday"))
        .and(header("Authorization", "Bearer tok"))
        .and(header_regex(
            "content-type",
            "^multipart/form-data; boundary=----MediaTransferBoundary",
        ))
        .and(body_string_contains("name=\"files\"; filename=\"clip.mp4\""))
        .and(body_string_contains("Content-Type: video/mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "uploaded": [{ "name": "clip.mp4", "size": 50000 }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let upload_url = format!("{}/api/upload", server.uri());
    let request = TransferRequest::upload(
        upload_url.clone(),
        vec![NamedBlob::new("clip.mp4", vec![7u8; 50_000])],
    )
    .with_destination_path("holiday")
    .with_auth_token(AuthToken::new("tok"));

    let notifier = RecordingNotifier::default();
    let outcome = small_chunk_engine()
        .start_transfer(request, notifier.clone())
        .result()
        .await;

    let (payload, final_name) = match outcome {
        TransferOutcome::Success {
            payload,
            final_name,
        } => (payload, final_name),
        other => panic!("upload should succeed: {other:?}"),
    };
    assert_eq!(final_name, "clip.mp4");
    let receipt = UploadReceipt::parse(&upload_url, &payload).expect("receipt should parse");
    assert_eq!(receipt.count(), 1);

    let bytes = notifier.bytes();
    assert!(bytes.len() > 1, "expected several send credits: {bytes:?}");
    assert!(bytes.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(notifier.percents().last().copied().flatten(), Some(100.0));

    // Declared size matches what went over the wire.
    let requests = server.received_requests().await.expect("recording enabled");
    let body_len = requests[0].body.len() as u64;
    assert_eq!(bytes.last().copied(), Some(body_len));
    let declared: u64 = requests[0]
        .headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("content-length header");
    assert_eq!(declared, body_len);
}

#[tokio::test]
async fn test_upload_multiple_blobs_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("filename=\"a.jpg\""))
        .and(body_string_contains("filename=\"b.png\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "uploaded": [{ "name": "a.jpg" }, { "name": "b.png" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let upload_url = format!("{}/upload", server.uri());
    let request = TransferRequest::upload(
        upload_url.clone(),
        vec![
            NamedBlob::new("a.jpg", vec![1u8; 100]),
            NamedBlob::new("b.png", vec![2u8; 100]),
        ],
    );
    let outcome = small_chunk_engine()
        .start_transfer(request, RecordingNotifier::default())
        .result()
        .await;

    let payload = outcome.payload().expect("upload should succeed");
    let receipt = UploadReceipt::parse(&upload_url, payload).expect("receipt should parse");
    assert_eq!(receipt.count(), 2);
}

#[tokio::test]
async fn test_upload_server_error_after_full_send_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let request = TransferRequest::upload(
        format!("{}/upload", server.uri()),
        vec![NamedBlob::new("clip.mp4", vec![0u8; 10_000])],
    );
    let notifier = RecordingNotifier::default();
    let outcome = small_chunk_engine()
        .start_transfer(request, notifier.clone())
        .result()
        .await;

    match outcome {
        TransferOutcome::Failed(error) => {
            assert_eq!(error.kind(), ErrorKind::HttpStatusError);
            assert_eq!(error.status(), Some(500));
        }
        other => panic!("expected HTTP status failure, got {other:?}"),
    }
    assert_eq!(
        notifier.finished(),
        [(false, Some(ErrorKind::HttpStatusError))]
    );
}

#[tokio::test]
async fn test_upload_unreadable_receipt_is_malformed_only_via_helper() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let upload_url = format!("{}/upload", server.uri());
    let outcome = small_chunk_engine()
        .start_transfer(
            TransferRequest::upload(upload_url.clone(), vec![NamedBlob::new("a.txt", "hi")]),
            RecordingNotifier::default(),
        )
        .result()
        .await;

    let payload = outcome.payload().expect("session itself completes");
    let err = UploadReceipt::parse(&upload_url, payload).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}
