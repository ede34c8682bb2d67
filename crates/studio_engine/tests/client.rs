use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use studio_engine::{
    ClientSettings, DownloadError, GenerateRequest, JobState, Level, Quality, RegenerateRequest,
    RenderRequest, ReqwestStudioClient, Style, StudioApi, VideoStore,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestStudioClient {
    let base_url = Url::parse(&server.uri()).unwrap();
    ReqwestStudioClient::new(ClientSettings::new(base_url)).unwrap()
}

fn generate_request(topic: &str) -> GenerateRequest {
    GenerateRequest {
        topic: topic.to_string(),
        duration_seconds: 60,
        style: Style::GeometricHeavy,
        level: Level::School,
        additional_instructions: "Use area transformations.".to_string(),
    }
}

#[tokio::test]
async fn generate_posts_params_and_parses_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({
            "topic": "Pythagoras",
            "duration_seconds": 60,
            "style": "geometric-heavy",
            "level": "school",
            "additional_instructions": "Use area transformations."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "print(1)",
            "model": "m",
            "warnings": ["long scene"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .generate(&generate_request("Pythagoras"))
        .await
        .expect("generate ok");

    assert_eq!(response.code, "print(1)");
    assert_eq!(response.model, "m");
    assert_eq!(response.warnings, vec!["long scene".to_string()]);
}

#[tokio::test]
async fn missing_warnings_default_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": "x", "model": "m"})),
        )
        .mount(&server)
        .await;

    let response = client_for(&server)
        .generate(&generate_request("topic"))
        .await
        .unwrap();
    assert!(response.warnings.is_empty());
}

#[tokio::test]
async fn error_body_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    let body = r#"{"detail":"topic too short"}"#;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(422).set_body_string(body))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&generate_request(""))
        .await
        .unwrap_err();
    assert_eq!(err.message, body);
    assert_eq!(err.to_string(), body);
}

#[tokio::test]
async fn empty_error_body_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/regenerate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .regenerate(&RegenerateRequest {
            code: "print(1)".to_string(),
            instruction: "shorter".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.message, "API request failed: 503");
}

#[tokio::test]
async fn render_passes_quality_and_retry_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/render"))
        .and(body_json(json!({
            "code": "print(1)",
            "quality": "720p30",
            "retry_on_error": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": "abc", "status": "queued"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .render(&RenderRequest {
            code: "print(1)".to_string(),
            quality: Quality::P720p30,
            retry_on_error: false,
        })
        .await
        .unwrap();
    assert_eq!(response.job_id, "abc");
    assert_eq!(response.status, JobState::Queued);
}

#[tokio::test]
async fn status_is_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/abc"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "abc",
            "status": "rendering",
            "progress": 40,
            "stage": "encoding",
            "error": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:04Z"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.status("abc").await.unwrap();
    let second = client.status("abc").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.status, JobState::Rendering);
    assert_eq!(first.progress, 40);
    assert_eq!(first.stage, "encoding");
    assert_eq!(first.error, None);
}

#[tokio::test]
async fn unknown_status_value_is_a_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "abc",
            "status": "exploded",
            "progress": 0
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).status("abc").await.unwrap_err();
    assert!(err.message.starts_with("malformed response:"), "{err}");
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base_url = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
    let client = ReqwestStudioClient::new(ClientSettings::new(base_url)).unwrap();

    let err = client.status("abc").await.unwrap_err();
    assert!(err.message.starts_with("network error:"), "{err}");
}

#[tokio::test]
async fn download_video_writes_file_named_after_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"fake-mp4".to_vec(), "video/mp4"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let store = VideoStore::new(temp.path().join("videos"));
    let saved = client_for(&server)
        .download_video("abc", &store)
        .await
        .expect("download ok");

    assert_eq!(saved, temp.path().join("videos").join("abc.mp4"));
    assert_eq!(fs::read(&saved).unwrap(), b"fake-mp4");
}

#[tokio::test]
async fn download_before_ready_reports_server_text_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/abc"))
        .respond_with(
            ResponseTemplate::new(409).set_body_string(r#"{"detail":"Video is not ready yet"}"#),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let store = VideoStore::new(temp.path().to_path_buf());
    let err = client_for(&server)
        .download_video("abc", &store)
        .await
        .unwrap_err();

    match err {
        DownloadError::Request(err) => {
            assert_eq!(err.message, r#"{"detail":"Video is not ready yet"}"#)
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!store.path_for("abc").exists());
}

#[tokio::test]
async fn slow_download_outlives_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"slow-mp4".to_vec(), "video/mp4")
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"job_id": "abc", "status": "done", "progress": 100}))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;

    let mut settings = ClientSettings::new(Url::parse(&server.uri()).unwrap());
    settings.request_timeout = Duration::from_millis(200);
    settings.download_timeout = Duration::from_secs(5);
    let client = ReqwestStudioClient::new(settings).unwrap();

    let err = client.status("abc").await.unwrap_err();
    assert!(err.message.starts_with("network error:"), "{err}");

    let temp = TempDir::new().unwrap();
    let store = VideoStore::new(temp.path().to_path_buf());
    let saved = client.download_video("abc", &store).await.expect("download ok");
    assert_eq!(fs::read(&saved).unwrap(), b"slow-mp4");
}
