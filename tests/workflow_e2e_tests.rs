//! End-to-end workflow tests
//!
//! Drive a `WorkflowSession` against a real gateway instance backed by a
//! mocked vendor, covering the full upload-and-clone sequence, the clone
//! guard, and error recovery.

use axum::Router;
use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voiceclone_gateway::workflow::WorkflowError;
use voiceclone_gateway::{AppState, ServerConfig, WorkflowSession, WorkflowState, config, routes};

fn create_test_config(vendor_uri: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        upload_endpoint: format!("{vendor_uri}/upload"),
        clone_endpoint: format!("{vendor_uri}/clone"),
        api_key: "test-api-key".to_string(),
        group_id: "group-123".to_string(),
        vendor_timeout_seconds: Some(5),
        max_upload_bytes: config::DEFAULT_MAX_UPLOAD_BYTES,
        cors_allowed_origins: None,
        rate_limit_requests_per_second: 100000, // Disable for tests
        rate_limit_burst_size: 100,
    }
}

/// Start a gateway on an ephemeral port, returning its base URL
async fn spawn_gateway(config: ServerConfig) -> String {
    let max_upload_bytes = config.max_upload_bytes;
    let app_state = AppState::new(config);
    let app = Router::new()
        .merge(routes::api::create_api_router(max_upload_bytes))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn mount_upload_success(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "file": { "file_id": "abc123" } })),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_full_upload_and_clone_flow() {
    let mock_server = MockServer::start().await;
    mount_upload_success(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/clone"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "demo_audio": "https://x/y.mp3" })),
        )
        .mount(&mock_server)
        .await;

    let base_url = spawn_gateway(create_test_config(&mock_server.uri())).await;
    let session = WorkflowSession::new(base_url);

    assert_eq!(session.state(), WorkflowState::Idle);
    assert!(!session.can_request_clone());

    // Upload a file large enough to stream in several chunks
    let file_id = session
        .upload_file("sample.mp3", Bytes::from(vec![7u8; 200 * 1024]))
        .await
        .expect("upload should succeed");
    assert_eq!(file_id, "abc123");
    assert_eq!(
        session.state(),
        WorkflowState::Uploaded {
            file_id: "abc123".to_string()
        }
    );
    // Progress indicator is cleared once the upload finished
    assert_eq!(session.upload_progress(), None);

    // Clone gated on voice name and text
    assert!(!session.can_request_clone());
    session.set_voice_name("My Voice");
    session.set_text("Hello world");
    assert!(session.can_request_clone());

    let audio_url = session.request_clone().await.expect("clone should succeed");
    assert_eq!(audio_url, "https://x/y.mp3");
    assert!(matches!(session.state(), WorkflowState::Cloned { .. }));

    // Playback controls become available
    assert_eq!(session.audio_url().as_deref(), Some("https://x/y.mp3"));
    assert_eq!(session.toggle_playback(), Some(true));
    session.on_time_update(3.0, 65.0);
    let playback = session.playback().unwrap();
    assert!(playback.is_playing);
    assert_eq!(playback.duration, 65.0);
    assert_eq!(
        session.download_filename(),
        Some("cloned_voice_My Voice.mp3".to_string())
    );
}

#[tokio::test]
async fn test_whitespace_text_rejected_without_network_call() {
    let mock_server = MockServer::start().await;
    mount_upload_success(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/clone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let base_url = spawn_gateway(create_test_config(&mock_server.uri())).await;
    let session = WorkflowSession::new(base_url);

    session
        .upload_file("sample.mp3", Bytes::from_static(b"audio"))
        .await
        .unwrap();
    session.set_voice_name("My Voice");
    session.set_text("   ");

    assert!(!session.can_request_clone());
    let result = session.request_clone().await;
    assert_eq!(result, Err(WorkflowError::EmptyText));
    assert_eq!(
        session.clone_error().as_deref(),
        Some("Please enter text for voice cloning")
    );
}

#[tokio::test]
async fn test_clone_error_then_retry_without_reupload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "file": { "file_id": "abc123" } })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    // First clone attempt fails with a vendor-reported error, second succeeds
    Mock::given(method("POST"))
        .and(path("/clone"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "voice sample too short" })),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clone"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "demo_audio": "https://x/y.mp3" })),
        )
        .mount(&mock_server)
        .await;

    let base_url = spawn_gateway(create_test_config(&mock_server.uri())).await;
    let session = WorkflowSession::new(base_url);

    session
        .upload_file("sample.mp3", Bytes::from_static(b"audio"))
        .await
        .unwrap();
    session.set_voice_name("My Voice");
    session.set_text("Hello world");

    let result = session.request_clone().await;
    assert_eq!(
        result,
        Err(WorkflowError::CloneFailed(
            "voice sample too short".to_string()
        ))
    );
    // File identifier retained; the user can retry without re-uploading
    assert_eq!(
        session.state(),
        WorkflowState::Uploaded {
            file_id: "abc123".to_string()
        }
    );
    assert_eq!(
        session.clone_error().as_deref(),
        Some("voice sample too short")
    );

    let audio_url = session.request_clone().await.expect("retry should succeed");
    assert_eq!(audio_url, "https://x/y.mp3");
    assert!(session.clone_error().is_none());
}

#[tokio::test]
async fn test_upload_failure_returns_to_idle() {
    // Vendor unreachable: the gateway responds 500 and the workflow returns
    // to Idle with the progress indicator cleared
    let base_url = spawn_gateway(create_test_config("http://127.0.0.1:1")).await;
    let session = WorkflowSession::new(base_url);

    let result = session
        .upload_file("sample.mp3", Bytes::from_static(b"audio"))
        .await;
    assert_eq!(
        result,
        Err(WorkflowError::UploadFailed("Upload failed".to_string()))
    );
    assert_eq!(session.state(), WorkflowState::Idle);
    assert_eq!(session.upload_progress(), None);
    assert_eq!(session.upload_error().as_deref(), Some("Upload failed"));
}

#[tokio::test]
async fn test_upload_vendor_error_envelope_surfaces_failure() {
    // The gateway forwards the vendor's error envelope with a 200; the
    // coordinator treats a body without a file identifier as a failed upload
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_resp": { "status_code": 1004, "status_msg": "invalid audio" }
        })))
        .mount(&mock_server)
        .await;

    let base_url = spawn_gateway(create_test_config(&mock_server.uri())).await;
    let session = WorkflowSession::new(base_url);

    let result = session
        .upload_file("sample.mp3", Bytes::from_static(b"audio"))
        .await;
    assert_eq!(result, Err(WorkflowError::MalformedUploadResponse));
    assert_eq!(session.state(), WorkflowState::Idle);
    assert_eq!(session.upload_error().as_deref(), Some("Upload failed"));
}
