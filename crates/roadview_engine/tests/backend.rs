use std::fs;
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use roadview_engine::{
    AtomicFileWriter, BackendClient, EngineConfig, FailureKind, MetricsReport, ReqwestBackend,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, dir: &TempDir) -> ReqwestBackend {
    let mut config = EngineConfig::default_with_output(dir.path().to_path_buf());
    config.base_url = server.uri();
    ReqwestBackend::new(&config).expect("backend")
}

fn video_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"\x00\x00\x00\x18ftypmp42 fake video").unwrap();
    path
}

#[tokio::test]
async fn upload_posts_multipart_file_and_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"drive.mp4\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let job_id = backend
        .upload(&video_file(&dir, "drive.mp4"))
        .await
        .expect("upload ok");

    assert_eq!(job_id, "abc123");
}

#[tokio::test]
async fn upload_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let err = backend
        .upload(&video_file(&dir, "drive.mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn upload_without_job_id_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let err = backend
        .upload(&video_file(&dir, "drive.mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn upload_of_missing_file_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let err = backend
        .upload(&dir.path().join("missing.mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn upload_transport_failure_is_network_error() {
    let dir = TempDir::new().unwrap();
    let mut config = EngineConfig::default_with_output(dir.path().to_path_buf());
    // Nothing listens on port 9 locally.
    config.base_url = "http://127.0.0.1:9".to_string();
    config.connect_timeout = Duration::from_millis(500);
    let backend = ReqwestBackend::new(&config).unwrap();

    let err = backend
        .upload(&video_file(&dir, "drive.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}

#[tokio::test]
async fn job_status_returns_full_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "status": "processing",
            "progress": 0.4,
            "filename": "drive.mp4"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let report = backend.job_status("abc123").await.expect("status ok");

    assert_eq!(report["status"], json!("processing"));
    assert_eq!(report["progress"], json!(0.4));
    assert_eq!(report.len(), 4);
}

#[tokio::test]
async fn job_status_for_unknown_job_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let err = backend.job_status("nope").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn job_id_is_escaped_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let report = backend.job_status("a/b").await.expect("status ok");

    assert_eq!(report["status"], json!("queued"));
}

#[tokio::test]
async fn status_times_out_on_slow_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"status": "queued"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = EngineConfig::default_with_output(dir.path().to_path_buf());
    config.base_url = server.uri();
    config.request_timeout = Duration::from_millis(50);
    let backend = ReqwestBackend::new(&config).unwrap();

    let err = backend.job_status("slow").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn download_streams_artifact_to_disk() {
    let server = MockServer::start().await;
    let artifact = vec![7u8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/api/download/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(artifact.clone(), "video/mp4"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let writer = AtomicFileWriter::new(dir.path().join("out"));
    let saved = roadview_engine::save_result(&backend, &writer, "abc123", "drive.mp4")
        .await
        .expect("download ok");

    assert_eq!(saved.file_name().unwrap(), "processed_abc123_drive.mp4");
    assert_eq!(fs::read(&saved).unwrap(), artifact);
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/abc123"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Result not ready"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let out = dir.path().join("out");
    let writer = AtomicFileWriter::new(out.clone());
    let err = roadview_engine::save_result(&backend, &writer, "abc123", "drive.mp4")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn live_upload_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let err = backend
        .upload_live(&video_file(&dir, "road.mp4"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Rejected);
}

#[tokio::test]
async fn live_upload_accepts_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("filename=\"road.mp4\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    backend
        .upload_live(&video_file(&dir, "road.mp4"))
        .await
        .expect("live upload ok");
}

#[tokio::test]
async fn feed_url_carries_cache_bust_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video_feed"))
        .and(query_param("t", "1700000000123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "--frame\r\nContent-Type: image/jpeg\r\n\r\nJPEG\r\n",
            "multipart/x-mixed-replace; boundary=frame",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let mut stream = backend.open_feed(1_700_000_000_123).await.expect("feed ok");

    let mut received = 0;
    while let Some(chunk) = stream.next().await {
        received += chunk.expect("chunk").len();
    }
    assert!(received > 0);
}

#[tokio::test]
async fn feed_error_status_fails_to_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video_feed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let err = backend.open_feed(1).await.err().expect("feed should fail");

    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn metrics_decode_with_missing_signs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": -0.31,
            "curvature": 912.4,
            "fps": 27.5
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let metrics = backend.metrics().await.expect("metrics ok");

    assert_eq!(
        metrics,
        MetricsReport {
            offset: -0.31,
            curvature: 912.4,
            fps: 27.5,
            signs: Vec::new(),
        }
    );
}

#[tokio::test]
async fn metrics_decode_with_null_signs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0.0,
            "curvature": 900.0,
            "fps": 25.0,
            "signs": null
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let backend = backend_for(&server, &dir);
    let metrics = backend.metrics().await.expect("metrics ok");

    assert_eq!(metrics.curvature, 900.0);
    assert!(metrics.signs.is_empty());
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roadview/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"signs": ["Stop"]})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = EngineConfig::default_with_output(dir.path().to_path_buf());
    config.base_url = format!("{}/roadview", server.uri());
    let backend = ReqwestBackend::new(&config).unwrap();

    let metrics = backend.metrics().await.expect("metrics ok");
    assert_eq!(metrics.signs, vec!["Stop".to_string()]);
}

#[test]
fn invalid_base_url_is_rejected() {
    let mut config = EngineConfig::default_with_output(std::env::temp_dir());
    config.base_url = "not a url".to_string();

    let err = ReqwestBackend::new(&config).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
